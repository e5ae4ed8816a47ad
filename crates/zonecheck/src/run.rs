// # Program Runs
//
// Wires the configuration to a Cloudflare client and sequences the calls
// each program makes. Every remote call is awaited before the next one.

use std::sync::Arc;

use tracing::{info, warn};
use zonecheck_core::traits::{LoggingObserver, Zone};
use zonecheck_core::{
    DirectoryClient, Report, Result, RunRecorder, SequenceOutcome, VerificationSequencer,
};
use zonecheck_provider_cloudflare::CloudflareClient;

use crate::cli::Program;
use crate::config::Config;

/// Build the Cloudflare client described by `config`
pub fn build_client(config: &Config) -> Result<CloudflareClient> {
    let mut builder = CloudflareClient::builder(config.credentials.clone());
    if let Some(ref api_base) = config.api_base {
        builder = builder.api_base(api_base);
    }
    if config.trace {
        builder = builder.observer(Arc::new(LoggingObserver));
    }
    builder.build()
}

/// Run `program` against `client`
///
/// # Returns
///
/// - `Ok(Report)`: the report to print (conflicts included)
/// - `Err(Error)`: the first fatal failure, annotated with its step
pub async fn execute(
    program: Program,
    zone_name: Option<&str>,
    client: &dyn DirectoryClient,
) -> Result<Report> {
    info!(
        "{}: using {} directory client",
        program.name(),
        client.provider_name()
    );

    let user = client
        .user_details()
        .await
        .map_err(|e| e.context("fetch user details"))?;
    info!("Authenticated as user {}", user.id);

    let zone = match zone_name {
        Some(name) => Some(resolve_zone(client, name).await?),
        None => None,
    };

    let mut recorder = RunRecorder::new();

    if program.verifies() {
        let Some(ref zone) = zone else {
            return Err(zonecheck_core::Error::config(format!(
                "{} needs a zone",
                program.name()
            )));
        };

        let sequencer = VerificationSequencer::new(client, program.sequence_config())?;
        match sequencer.run(zone, &mut recorder).await? {
            SequenceOutcome::Completed => {
                info!("Verification sequence completed for zone {}", zone.name);
            }
            SequenceOutcome::Conflict { names } => {
                warn!(
                    "Zone {} already holds {} reserved test record(s); nothing was changed",
                    zone.name,
                    names.len()
                );
            }
        }
    }

    Ok(recorder.finish(Some(user), zone))
}

async fn resolve_zone(client: &dyn DirectoryClient, name: &str) -> Result<Zone> {
    let zone_id = client
        .zone_id_by_name(name)
        .await
        .map_err(|e| e.context(format!("resolve zone {}", name)))?;

    let zone = client
        .zone_details(&zone_id)
        .await
        .map_err(|e| e.context("fetch zone details"))?;

    info!("Resolved zone {} -> {}", zone.name, zone.id);
    Ok(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_test::assert_ok;
    use zonecheck_core::Error;
    use zonecheck_core::traits::{DnsRecord, NewRecord, RecordResponse, User};

    /// Directory with one zone and no records; mutations succeed
    #[derive(Default)]
    struct StubDirectory {
        calls: Mutex<Vec<String>>,
        records: Mutex<Vec<DnsRecord>>,
    }

    impl StubDirectory {
        fn log(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DirectoryClient for StubDirectory {
        async fn user_details(&self) -> Result<User> {
            self.log("user");
            Ok(User {
                id: "user-1".to_string(),
                email: Some("ops@example.com".to_string()),
                ..Default::default()
            })
        }

        async fn zone_id_by_name(&self, zone_name: &str) -> Result<String> {
            self.log("zone_id");
            if zone_name == "example.com" {
                Ok("zone-1".to_string())
            } else {
                Err(Error::not_found(format!("Zone not found: {}", zone_name)))
            }
        }

        async fn zone_details(&self, zone_id: &str) -> Result<Zone> {
            self.log("zone");
            Ok(Zone {
                id: zone_id.to_string(),
                name: "example.com".to_string(),
                ..Default::default()
            })
        }

        async fn list_records(&self, _zone_id: &str) -> Result<Vec<DnsRecord>> {
            self.log("list");
            Ok(self.records.lock().unwrap().clone())
        }

        async fn create_record(&self, _zone_id: &str, record: &NewRecord) -> Result<RecordResponse> {
            self.log("create");
            let mut records = self.records.lock().unwrap();
            if records
                .iter()
                .any(|r| r.name == record.name && r.content == record.content)
            {
                return Ok(RecordResponse::failed(vec![]));
            }
            let created = DnsRecord {
                id: format!("rec-{}", self.calls.lock().unwrap().len()),
                name: record.name.clone(),
                record_type: record.record_type.clone(),
                content: record.content.clone(),
                ttl: record.ttl,
                ..Default::default()
            };
            records.push(created.clone());
            Ok(RecordResponse::ok(created))
        }

        async fn update_record(
            &self,
            _zone_id: &str,
            record_id: &str,
            record: &NewRecord,
        ) -> Result<RecordResponse> {
            self.log("update");
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.id == record_id) {
                Some(existing) => {
                    existing.name = record.name.clone();
                    Ok(RecordResponse::ok(existing.clone()))
                }
                None => Ok(RecordResponse::failed(vec![])),
            }
        }

        async fn get_record(&self, _zone_id: &str, record_id: &str) -> Result<DnsRecord> {
            self.log("get");
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == record_id)
                .cloned()
                .ok_or_else(|| Error::not_found(record_id.to_string()))
        }

        async fn delete_record(&self, _zone_id: &str, record_id: &str) -> Result<()> {
            self.log("delete");
            self.records.lock().unwrap().retain(|r| r.id != record_id);
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_zone_info_without_zone() {
        let directory = StubDirectory::default();
        let report = assert_ok!(execute(Program::ZoneInfo, None, &directory).await);

        assert_eq!(directory.calls(), vec!["user"]);
        assert!(report.zone.is_none());
        assert!(report.ids.is_empty());
        assert_eq!(report.user.unwrap().id, "user-1");
    }

    #[tokio::test]
    async fn test_zone_info_with_zone() {
        let directory = StubDirectory::default();
        let report = assert_ok!(execute(Program::ZoneInfo, Some("example.com"), &directory).await);

        assert_eq!(directory.calls(), vec!["user", "zone_id", "zone"]);
        assert_eq!(report.zone.unwrap().id, "zone-1");
        assert!(report.responses.is_empty());
    }

    #[tokio::test]
    async fn test_verify_runs_sequence_with_probe() {
        let directory = StubDirectory::default();
        let report = assert_ok!(execute(Program::Verify, Some("example.com"), &directory).await);

        assert_eq!(report.ids.len(), 2);
        assert_eq!(report.ids[0], report.ids[1]);
        assert!(report.duplicate_probe.is_some());
        assert_eq!(directory.calls().iter().filter(|c| *c == "create").count(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["user"]["email"], "ops@example.com");
        assert_eq!(json["zone"]["name"], "example.com");
    }

    #[tokio::test]
    async fn test_legacy_runs_extra_records() {
        let directory = StubDirectory::default();
        let report =
            assert_ok!(execute(Program::VerifyLegacy, Some("example.com"), &directory).await);

        assert!(report.duplicate_probe.is_none());
        assert_eq!(directory.calls().iter().filter(|c| *c == "create").count(), 3);
        assert!(directory.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_zone_is_fatal() {
        let directory = StubDirectory::default();
        let err = execute(Program::Verify, Some("missing.example"), &directory)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("resolve zone missing.example failed"));
        assert!(!directory.calls().contains(&"create".to_string()));
    }

    #[test]
    fn test_build_client_honors_api_base() {
        let config = Config {
            program: Program::ZoneInfo,
            zone: None,
            trace: true,
            credentials: zonecheck_core::Credentials::ApiToken("abc123".to_string()),
            api_base: Some("http://127.0.0.1:8080/client/v4".to_string()),
            log_level: "info".to_string(),
        };
        let client = build_client(&config).unwrap();
        assert_eq!(client.api_base(), "http://127.0.0.1:8080/client/v4");
    }
}
