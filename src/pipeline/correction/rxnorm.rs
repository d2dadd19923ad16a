use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;

use super::types::TerminologyClient;
use super::TerminologyError;

/// Property holding the canonical drug name.
const CANONICAL_NAME_PROPERTY: &str = "RxNorm Name";

/// RxNav REST client (National Library of Medicine drug terminology).
pub struct RxNavClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RxNavClient {
    /// `timeout` bounds each lookup; correction must not wait on a slow service.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TerminologyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TerminologyError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TerminologyError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TerminologyError::Timeout
                } else if e.is_connect() {
                    TerminologyError::Connection(self.base_url.clone())
                } else {
                    TerminologyError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TerminologyError::Service(status.as_u16()));
        }

        response
            .json()
            .map_err(|e| TerminologyError::ResponseParsing(e.to_string()))
    }
}

/// `GET /rxcui.json?name=...`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxcuiResponse {
    id_group: Option<IdGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdGroup {
    #[serde(default)]
    rxnorm_id: Vec<String>,
}

/// `GET /rxcui/{id}/property.json?propName=...`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyResponse {
    prop_concept_group: Option<PropConceptGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropConceptGroup {
    #[serde(default)]
    prop_concept: Vec<PropConcept>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropConcept {
    #[serde(default)]
    prop_value: String,
}

fn first_concept_id(response: RxcuiResponse) -> Option<String> {
    response
        .id_group
        .and_then(|g| g.rxnorm_id.into_iter().next())
        .filter(|id| !id.trim().is_empty())
}

fn first_property_value(response: PropertyResponse) -> Option<String> {
    response
        .prop_concept_group
        .and_then(|g| g.prop_concept.into_iter().next())
        .map(|c| c.prop_value)
        .filter(|v| !v.trim().is_empty())
}

impl TerminologyClient for RxNavClient {
    fn find_concept_id(&self, name: &str) -> Result<Option<String>, TerminologyError> {
        let url = format!("{}/rxcui.json", self.base_url);
        let response: RxcuiResponse = self.get(&url, &[("name", name)])?;
        Ok(first_concept_id(response))
    }

    fn canonical_name(&self, concept_id: &str) -> Result<Option<String>, TerminologyError> {
        let url = format!("{}/rxcui/{concept_id}/property.json", self.base_url);
        let response: PropertyResponse = self.get(&url, &[("propName", CANONICAL_NAME_PROPERTY)])?;
        Ok(first_property_value(response))
    }
}

/// Mock terminology client for testing. Maps written names to canonical names
/// and counts every call.
pub struct MockTerminologyClient {
    names: HashMap<String, String>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockTerminologyClient {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|(written, canonical)| (written.to_lowercase(), canonical.to_string()))
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Knows no drugs.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Every call fails as if the service were unreachable.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::empty()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TerminologyClient for MockTerminologyClient {
    fn find_concept_id(&self, name: &str) -> Result<Option<String>, TerminologyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TerminologyError::Connection("mock".into()));
        }
        let key = name.to_lowercase();
        Ok(self.names.contains_key(&key).then_some(key))
    }

    fn canonical_name(&self, concept_id: &str) -> Result<Option<String>, TerminologyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TerminologyError::Connection("mock".into()));
        }
        Ok(self.names.get(concept_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_id_is_first_rxnorm_id() {
        let response: RxcuiResponse = serde_json::from_str(
            r#"{"idGroup":{"name":"ibuprofen","rxnormId":["5640","999"]}}"#,
        )
        .unwrap();
        assert_eq!(first_concept_id(response), Some("5640".to_string()));
    }

    #[test]
    fn unknown_name_has_no_concept_id() {
        let response: RxcuiResponse =
            serde_json::from_str(r#"{"idGroup":{"name":"zzyzx"}}"#).unwrap();
        assert_eq!(first_concept_id(response), None);

        let response: RxcuiResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(first_concept_id(response), None);
    }

    #[test]
    fn property_value_is_first_concept() {
        let response: PropertyResponse = serde_json::from_str(
            r#"{"propConceptGroup":{"propConcept":[{"propCategory":"NAMES","propName":"RxNorm Name","propValue":"ibuprofen"}]}}"#,
        )
        .unwrap();
        assert_eq!(first_property_value(response), Some("ibuprofen".to_string()));
    }

    #[test]
    fn missing_property_is_none() {
        let response: PropertyResponse =
            serde_json::from_str(r#"{"propConceptGroup":null}"#).unwrap();
        assert_eq!(first_property_value(response), None);

        let response: PropertyResponse = serde_json::from_str(
            r#"{"propConceptGroup":{"propConcept":[{"propValue":"  "}]}}"#,
        )
        .unwrap();
        assert_eq!(first_property_value(response), None);
    }

    #[test]
    fn unreachable_service_is_an_error() {
        let client = RxNavClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(client.find_concept_id("ibuprofen").is_err());
    }

    #[test]
    fn silent_service_times_out() {
        // Bound but never answered: the handshake completes, the response never comes.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client =
            RxNavClient::new(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();

        assert!(matches!(
            client.find_concept_id("ibuprofen"),
            Err(TerminologyError::Timeout)
        ));
        drop(listener);
    }

    #[test]
    fn mock_round_trips_names_and_counts_calls() {
        let mock = MockTerminologyClient::new(&[("Ibuprofin", "ibuprofen")]);
        let id = mock.find_concept_id("IBUPROFIN").unwrap().unwrap();
        assert_eq!(mock.canonical_name(&id).unwrap(), Some("ibuprofen".to_string()));
        assert_eq!(mock.find_concept_id("aspirin").unwrap(), None);
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn failing_mock_errors() {
        let mock = MockTerminologyClient::failing();
        assert!(mock.find_concept_id("x").is_err());
        assert_eq!(mock.call_count(), 1);
    }
}
