// Shapes of the list items the workflows select from.
//
// Ids are kept as `serde_json::Value`: depending on the endpoint the
// platform sends them as numbers or as strings. Use `utils::id_to_string`
// when an id goes into a path or file name. Names and tags may come back
// as `null` or be missing altogether; both read as empty.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::id_to_string;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientListing {
    pub client_id: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportListing {
    pub id: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub client_id: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ClientListing {
    pub fn id(&self) -> String {
        id_to_string(&self.client_id)
    }

    /// One line per client in selection menus.
    pub fn label(&self) -> String {
        format!("Name: {} | ID: {} | Tags: {}", self.name, self.id(), tag_list(&self.tags))
    }
}

impl ReportListing {
    pub fn id(&self) -> String {
        id_to_string(&self.id)
    }

    pub fn client_id(&self) -> String {
        id_to_string(&self.client_id)
    }

    pub fn label(&self) -> String {
        format!(
            "Name: {} | ID: {} | Tags: {} | Client ID: {}",
            self.name,
            self.id(),
            tag_list(&self.tags),
            self.client_id()
        )
    }
}

// Angle brackets instead of square ones so tag lists stand out from the
// surrounding menu text.
fn tag_list(tags: &[String]) -> String {
    format!("<{}>", tags.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_listing_accepts_numeric_ids_and_missing_tags() {
        let client: ClientListing =
            serde_json::from_value(json!({"client_id": 42, "name": "Acme", "poc": "x"})).unwrap();
        assert_eq!(client.id(), "42");
        assert!(client.tags.is_empty());
        assert_eq!(client.label(), "Name: Acme | ID: 42 | Tags: <>");
    }

    #[test]
    fn null_name_and_tags_read_as_empty() {
        let client: ClientListing =
            serde_json::from_value(json!({"client_id": 2, "name": "Globex", "tags": null})).unwrap();
        assert!(client.tags.is_empty());

        let report: ReportListing =
            serde_json::from_value(json!({"id": 5, "name": null, "client_id": 2})).unwrap();
        assert_eq!(report.name, "");
        assert_eq!(report.label(), "Name:  | ID: 5 | Tags: <> | Client ID: 2");
    }

    #[test]
    fn report_label_includes_client() {
        let report: ReportListing = serde_json::from_value(json!({
            "id": "r-7", "name": "Q3 Pentest", "client_id": 42, "tags": ["external", "web"]
        }))
        .unwrap();
        assert_eq!(
            report.label(),
            "Name: Q3 Pentest | ID: r-7 | Tags: <external, web> | Client ID: 42"
        );
    }
}
