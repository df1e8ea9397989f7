//! Spreadsheets API over the initialized client.

use crate::{SheetsError, SheetsResult};
use gapi_bootstrap::{BootstrapError, BootstrapResult, LibraryHandle, SpreadsheetsResource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Request body for creating a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetTemplate {
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTemplate {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub title: String,
    pub grid_properties: GridProperties,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    pub row_count: u32,
    pub column_count: u32,
}

impl SpreadsheetTemplate {
    /// Template titled `title` with one `rows` x `columns` sheet per entry
    /// in `sheet_titles`.
    pub fn with_sheets<'a>(
        title: &str,
        sheet_titles: impl IntoIterator<Item = &'a str>,
        rows: u32,
        columns: u32,
    ) -> Self {
        Self {
            properties: SpreadsheetProperties {
                title: title.to_string(),
            },
            sheets: sheet_titles
                .into_iter()
                .map(|sheet| SheetTemplate {
                    properties: SheetProperties {
                        title: sheet.to_string(),
                        grid_properties: GridProperties {
                            row_count: rows,
                            column_count: columns,
                        },
                    },
                })
                .collect(),
        }
    }
}

/// A spreadsheet document as returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Spreadsheet {
    id: String,
    raw: Value,
}

impl Spreadsheet {
    /// Wrap a raw API document; it must carry a `spreadsheetId`.
    pub fn from_raw(raw: Value) -> SheetsResult<Self> {
        let id = raw
            .get("spreadsheetId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(SheetsError::MissingId)?
            .to_string();
        Ok(Self { id, raw })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn title(&self) -> Option<&str> {
        self.raw.pointer("/properties/title").and_then(Value::as_str)
    }

    pub fn sheet_titles(&self) -> Vec<&str> {
        self.raw
            .get("sheets")
            .and_then(Value::as_array)
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|sheet| sheet.pointer("/properties/title").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Create and fetch spreadsheets. Cheap to clone; equality is identity.
#[derive(Clone)]
pub struct SpreadsheetsApi {
    resource: Arc<dyn SpreadsheetsResource>,
}

impl SpreadsheetsApi {
    pub fn new(resource: Arc<dyn SpreadsheetsResource>) -> Self {
        Self { resource }
    }

    /// Take the spreadsheets resource from an initialized library.
    pub fn from_library(library: &LibraryHandle) -> BootstrapResult<Self> {
        let client = library
            .client()
            .ok_or_else(|| BootstrapError::ModuleMissing("client".to_string()))?;
        let resource = client
            .spreadsheets()
            .ok_or_else(|| BootstrapError::ModuleMissing("client.sheets".to_string()))?;
        Ok(Self::new(resource))
    }

    pub async fn create(&self, template: &SpreadsheetTemplate) -> SheetsResult<Spreadsheet> {
        let resource = serde_json::to_value(template)?;
        debug!(title = %template.properties.title, sheets = template.sheets.len(), "Creating spreadsheet");

        let response = self
            .resource
            .create(resource)
            .await
            .map_err(SheetsError::Request)?;
        let spreadsheet = Spreadsheet::from_raw(response)?;

        debug!(spreadsheet_id = %spreadsheet.id(), "Created spreadsheet");
        Ok(spreadsheet)
    }

    pub async fn get(&self, spreadsheet_id: &str) -> SheetsResult<Spreadsheet> {
        debug!(spreadsheet_id = %spreadsheet_id, "Fetching spreadsheet");

        let response = self
            .resource
            .get(spreadsheet_id)
            .await
            .map_err(SheetsError::Request)?;
        Spreadsheet::from_raw(response)
    }
}

impl PartialEq for SpreadsheetsApi {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl fmt::Debug for SpreadsheetsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpreadsheetsApi").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl SpreadsheetsResource for Echo {
        async fn create(&self, mut resource: Value) -> Result<Value, String> {
            resource["spreadsheetId"] = json!("created-1");
            Ok(resource)
        }

        async fn get(&self, spreadsheet_id: &str) -> Result<Value, String> {
            match spreadsheet_id {
                "no-id" => Ok(json!({ "properties": { "title": "Orphan" } })),
                "forbidden" => Err("The caller does not have permission".to_string()),
                id => Ok(json!({ "spreadsheetId": id })),
            }
        }
    }

    #[test]
    fn test_template_wire_shape() {
        let template = SpreadsheetTemplate::with_sheets("Budget", ["Q1"], 2, 3);

        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({
                "properties": { "title": "Budget" },
                "sheets": [{
                    "properties": {
                        "title": "Q1",
                        "gridProperties": { "rowCount": 2, "columnCount": 3 }
                    }
                }]
            })
        );
    }

    #[test]
    fn test_spreadsheet_requires_id() {
        assert!(matches!(
            Spreadsheet::from_raw(json!({ "spreadsheetId": "" })),
            Err(SheetsError::MissingId)
        ));

        let sheet = Spreadsheet::from_raw(json!({
            "spreadsheetId": "abc",
            "properties": { "title": "T" },
            "sheets": [{ "properties": { "title": "One" } }]
        }))
        .unwrap();
        assert_eq!(sheet.id(), "abc");
        assert_eq!(sheet.title(), Some("T"));
        assert_eq!(sheet.sheet_titles(), vec!["One"]);
    }

    #[tokio::test]
    async fn test_create_returns_handle() {
        let api = SpreadsheetsApi::new(Arc::new(Echo));
        let template = SpreadsheetTemplate::with_sheets("Budget", ["A", "B"], 1, 1);

        let sheet = api.create(&template).await.unwrap();

        assert_eq!(sheet.id(), "created-1");
        assert_eq!(sheet.sheet_titles(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_get_errors() {
        let api = SpreadsheetsApi::new(Arc::new(Echo));

        assert!(matches!(api.get("no-id").await, Err(SheetsError::MissingId)));
        assert!(matches!(
            api.get("forbidden").await,
            Err(SheetsError::Request(ref reason)) if reason.contains("permission")
        ));
        assert_eq!(api.get("xyz").await.unwrap().id(), "xyz");
    }
}
