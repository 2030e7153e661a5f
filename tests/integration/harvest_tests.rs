use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use unit_harvest::checkpoint::{CompletedLog, PendingSnapshot};
use unit_harvest::config::{Config, HarvestConfig, OutputConfig, SourceConfig};
use unit_harvest::harvest::{Orchestrator, PendingOrigin};
use unit_harvest::{Entity, HarvestError, PendingEntry, RunPhase};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, dir: &TempDir, workers: usize, snapshot: bool) -> Config {
    Config {
        source: SourceConfig {
            base_url: base_url.to_string(),
            listing_path: "/Unit/Filter".to_string(),
            detail_path: "/Unit/Details".to_string(),
            custom_card_path: "/Unit/QuickCustom".to_string(),
            listing_filter: "Types=18".to_string(),
        },
        harvest: HarvestConfig {
            workers: Some(workers),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            retry_delay_ms: 1,
            ..HarvestConfig::default()
        },
        output: OutputConfig {
            results_path: results_path(dir).display().to_string(),
            pending_path: snapshot.then(|| snapshot_path(dir).display().to_string()),
        },
    }
}

fn results_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("unit_scrape_results.jsonl")
}

fn snapshot_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("remaining_units.json")
}

fn listing_page(units: &[(u32, &str)]) -> String {
    let rows: String = units
        .iter()
        .map(|(id, name)| format!("<tr><td><a href=\"/Unit/Details/{}/{}\">{}</a></td></tr>\n", id, name, name))
        .collect();
    format!("<html><body><table>\n{}</table></body></html>", rows)
}

fn card_page(name: &str, role: &str) -> String {
    format!(
        r#"<form>
<input id="Data_Name" name="Name" type="text" value="{}" />
<input id="Data_PV" name="PV" type="text" value="52" />
<input id="Data_Role" name="Role" type="text" value="{}" />
<input id="Data_Short" name="Short" type="text" value="5" />
<input id="Data_ShortMin" name="ShortMin" type="checkbox" checked="checked" value="true" />
</form>"#,
        name, role
    )
}

fn overview_page(unit_type: &str, role: &str) -> String {
    format!(
        r#"<dl>
    <dt>Tonnage</dt>
    <dd>100</dd>
    <dt>Battle Value</dt>
    <dd>1,897</dd>
    <dt>Unit Type</dt>
    <dd>{}</dd>
    <dt>Unit Role</dt>
    <dd>{}</dd>
</dl>"#,
        unit_type, role
    )
}

async fn mount_listing(server: &MockServer, units: &[(u32, &str)]) {
    Mock::given(method("GET"))
        .and(path("/Unit/Filter"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(units)))
        .mount(server)
        .await;
}

async fn mount_unit(server: &MockServer, id: u32, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/Unit/QuickCustom/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_page(name, "Brawler")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/Unit/Details/{}/{}", id, name)))
        .respond_with(ResponseTemplate::new(200).set_body_string(overview_page("BattleMech", "Brawler")))
        .mount(server)
        .await;
}

fn units(count: u32) -> Vec<(u32, String)> {
    (1..=count).map(|id| (id, format!("Unit-{}", id))).collect()
}

async fn mount_catalog(server: &MockServer, catalog: &[(u32, String)]) {
    let listed: Vec<(u32, &str)> = catalog.iter().map(|(id, n)| (*id, n.as_str())).collect();
    mount_listing(server, &listed).await;
    for (id, name) in catalog {
        mount_unit(server, *id, name).await;
    }
}

fn written_ids(dir: &TempDir) -> Vec<String> {
    CompletedLog::read_all(&results_path(dir))
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect()
}

#[tokio::test]
async fn test_full_harvest_writes_every_unit_once() {
    let server = MockServer::start().await;
    let catalog = units(12);
    mount_catalog(&server, &catalog).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 3, true);

    let mut orchestrator = Orchestrator::new(config, false).expect("Failed to create orchestrator");
    let report = orchestrator.run().await.expect("Harvest failed");

    assert_eq!(orchestrator.phase(), RunPhase::Done);
    assert_eq!(report.origin, PendingOrigin::Discovery);
    assert_eq!(report.dispatched, 12);
    assert_eq!(report.written, 12);
    assert_eq!(report.remaining, 0);

    let ids = written_ids(&dir);
    assert_eq!(ids.len(), 12);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 12);

    let records = CompletedLog::read_all(&results_path(&dir)).unwrap();
    let first = records.iter().find(|e| e.id == "1").unwrap();
    assert_eq!(first.card.name, "Unit-1");
    assert_eq!(first.card.point_value, 52);
    assert!(first.card.is_short_min_damage);
    assert_eq!(first.overview.tonnage, 100);
    assert_eq!(first.overview.battle_value, 1897);
    assert_eq!(first.overview.unit_type, "BattleMech");

    assert!(!snapshot_path(&dir).exists(), "snapshot should be removed after a complete run");
}

#[tokio::test]
async fn test_resume_skips_completed_units() {
    let server = MockServer::start().await;
    let catalog = units(6);
    let listed: Vec<(u32, &str)> = catalog.iter().map(|(id, n)| (*id, n.as_str())).collect();
    mount_listing(&server, &listed).await;

    // Only the units still to do are served
    for (id, name) in catalog.iter().skip(2) {
        mount_unit(&server, *id, name).await;
    }

    let dir = TempDir::new().unwrap();
    let mut log = CompletedLog::open(&results_path(&dir)).unwrap();
    for (id, name) in catalog.iter().take(2) {
        log.append(&Entity::pending(id.to_string(), name.clone())).unwrap();
    }
    drop(log);

    let config = create_test_config(&server.uri(), &dir, 2, false);
    let report = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(report.skipped_completed, 2);
    assert_eq!(report.dispatched, 4);
    assert_eq!(report.written, 4);

    let requests = server.received_requests().await.unwrap();
    let card_requests: Vec<String> = requests
        .iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with("/Unit/QuickCustom/"))
        .collect();
    assert_eq!(card_requests.len(), 4);
    for completed in ["/Unit/QuickCustom/1", "/Unit/QuickCustom/2"] {
        assert!(!card_requests.iter().any(|p| p == completed));
    }
    assert!(!requests
        .iter()
        .any(|r| r.url.path().starts_with("/Unit/Details/1/")
            || r.url.path().starts_with("/Unit/Details/2/")));

    let ids = written_ids(&dir);
    assert_eq!(ids.len(), 6);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 6);
}

#[tokio::test]
async fn test_missing_custom_card_page_keeps_defaults_and_continues() {
    let server = MockServer::start().await;
    mount_listing(&server, &[(1, "Unit-1"), (2, "Unit-2")]).await;
    mount_unit(&server, 1, "Unit-1").await;

    Mock::given(method("GET"))
        .and(path("/Unit/QuickCustom/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unit/Details/2/Unit-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(overview_page("Combat Vehicle", "Striker")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 1, true);
    let report = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(report.written, 2);

    let records = CompletedLog::read_all(&results_path(&dir)).unwrap();
    let second = records.iter().find(|e| e.id == "2").unwrap();
    assert_eq!(second.card.name, "");
    assert_eq!(second.card.point_value, 0);
    assert_eq!(second.card.role, "Striker");
    assert_eq!(second.overview.unit_type, "Combat Vehicle");
    assert!(!snapshot_path(&dir).exists());
}

#[tokio::test]
async fn test_redirected_custom_card_keeps_defaults_and_backfills_role() {
    let server = MockServer::start().await;
    mount_listing(&server, &[(7, "Savannah-Master-Hovercraft")]).await;

    Mock::given(method("GET"))
        .and(path("/Unit/QuickCustom/7"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/Unit/Details/7"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unit/Details/7/Savannah-Master-Hovercraft"))
        .respond_with(ResponseTemplate::new(200).set_body_string(overview_page("Combat Vehicle", "Scout")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 1, false);
    Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    let records = CompletedLog::read_all(&results_path(&dir)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].card.name, "");
    assert_eq!(records[0].card.point_value, 0);
    assert_eq!(records[0].card.role, "Scout");
    assert_eq!(records[0].overview.unit_type, "Combat Vehicle");
}

#[tokio::test]
async fn test_snapshot_resume_skips_discovery_and_dedupes_stale_entries() {
    let server = MockServer::start().await;
    let catalog = units(4);
    for (id, name) in &catalog {
        mount_unit(&server, *id, name).await;
    }
    Mock::given(method("GET"))
        .and(path("/Unit/Filter"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();

    // Unit 1 was written but the crash hit before the snapshot was rewritten
    let mut log = CompletedLog::open(&results_path(&dir)).unwrap();
    log.append(&Entity::pending("1", "Unit-1")).unwrap();
    drop(log);

    let entries: Vec<PendingEntry> = catalog
        .iter()
        .map(|(id, name)| PendingEntry {
            id: id.to_string(),
            designation: name.clone(),
        })
        .collect();
    PendingSnapshot::new(snapshot_path(&dir)).save(&entries).unwrap();

    let config = create_test_config(&server.uri(), &dir, 2, true);
    let report = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(report.origin, PendingOrigin::Snapshot);
    assert_eq!(report.skipped_completed, 1);
    assert_eq!(report.written, 3);

    let mut ids = written_ids(&dir);
    ids.sort();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert!(!snapshot_path(&dir).exists());
}

#[tokio::test]
async fn test_overview_failure_stops_run_and_keeps_snapshot() {
    let server = MockServer::start().await;
    mount_listing(&server, &[(1, "Unit-1"), (2, "Unit-2")]).await;
    mount_unit(&server, 1, "Unit-1").await;

    Mock::given(method("GET"))
        .and(path("/Unit/QuickCustom/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_page("Unit-2", "Sniper")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unit/Details/2/Unit-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 1, true);
    let err = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(
        matches!(err, HarvestError::HttpStatus { status: 404, .. }),
        "unexpected error: {}",
        err
    );

    let snapshot = PendingSnapshot::new(snapshot_path(&dir)).load().unwrap();
    let remaining: Vec<String> = snapshot.unwrap().into_iter().map(|e| e.id).collect();
    assert!(remaining.contains(&"2".to_string()));
    assert!(!written_ids(&dir).contains(&"2".to_string()));
}

#[tokio::test]
async fn test_transient_overview_failure_is_retried() {
    let server = MockServer::start().await;
    mount_listing(&server, &[(3, "Unit-3")]).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/Unit/QuickCustom/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_page("Unit-3", "Striker")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unit/Details/3/Unit-3"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Unit/Details/3/Unit-3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(overview_page("BattleMech", "Striker")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 1, false);
    let report = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(report.written, 1);
}

#[tokio::test]
async fn test_empty_listing_completes_without_work() {
    let server = MockServer::start().await;
    mount_listing(&server, &[]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 4, true);
    let report = Orchestrator::new(config, false)
        .unwrap()
        .run()
        .await
        .expect("Harvest failed");

    assert_eq!(report.dispatched, 0);
    assert_eq!(report.written, 0);
    assert!(Path::new(&results_path(&dir)).exists());
    assert!(!snapshot_path(&dir).exists());
}

#[tokio::test]
async fn test_interrupt_keeps_snapshot_for_resume() {
    let server = MockServer::start().await;
    let catalog = units(5);
    let listed: Vec<(u32, &str)> = catalog.iter().map(|(id, n)| (*id, n.as_str())).collect();
    mount_listing(&server, &listed).await;

    // Slow responses so the interrupt lands mid-run
    Mock::given(method("GET"))
        .and(path_regex(r"^/Unit/QuickCustom/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(card_page("Slow", "Brawler"))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/Unit/Details/\d+/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(overview_page("BattleMech", "Brawler")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 1, true);
    let err = Orchestrator::new(config, false)
        .unwrap()
        .run_until(tokio::time::sleep(std::time::Duration::from_millis(300)))
        .await
        .unwrap_err();

    let remaining = match err {
        HarvestError::Interrupted { remaining } => remaining,
        other => panic!("expected interruption, got {}", other),
    };
    assert!(remaining > 0);

    let written = written_ids(&dir);
    let snapshot = PendingSnapshot::new(snapshot_path(&dir)).load().unwrap().unwrap();
    assert_eq!(snapshot.len(), remaining);
    assert_eq!(written.len() + snapshot.len(), 5);
}
