use httpmock::prelude::*;
use regfish_scraper::adapters::session::session_file_name;
use regfish_scraper::{execute, Command, DomainName, ScrapeError, ScraperConfig, SessionJar};
use tempfile::TempDir;

const LOGGED_IN: &str = r#"<html><body><div id="nav"><div class="reb">Ausloggen</div></div></body></html>"#;
const LOGGED_OUT: &str = r#"<html><body><div id="nav"><div class="reb">Einloggen</div></div></body></html>"#;

fn config(server: &MockServer, session_dir: &TempDir) -> ScraperConfig {
    let mut config = ScraperConfig::default();
    config.portal.base_url = server.base_url();
    config.credentials.username = Some("alice".to_string());
    config.credentials.password = Some("s3cret".to_string());
    config.session.dir = Some(session_dir.path().to_path_buf());
    config.auth.retry_attempts = 0;
    config
}

fn list_page() -> String {
    r#"<html><body><div id="nav"><div class="reb">Ausloggen</div></div>
       <table>
         <tr class="dlistitem"><td class="col_domain"><a href="/my/domains/*/net/rootcamp/">rootcamp.net</a></td></tr>
         <tr class="dlistitem"><td class="col_domain"><a href="/my/domains/*/com/example/">example.com</a></td></tr>
       </table>
       <div class="re"><div><a href="/my/domains/list?site=1">«</a></div></div>
       </body></html>"#
        .to_string()
}

#[tokio::test]
async fn test_login_persists_session_for_next_run() {
    let session_dir = TempDir::new().unwrap();

    let first = MockServer::start();
    first.mock(|when, then| {
        when.method(GET).path("/my/login");
        then.status(200).body(LOGGED_OUT);
    });
    let submit = first.mock(|when, then| {
        when.method(POST)
            .path("/my/login")
            .body_contains("u=alice")
            .body_contains("p=s3cret");
        then.status(200)
            .header("Set-Cookie", "sid=abc123; Path=/; HttpOnly")
            .body(LOGGED_IN);
    });
    first.mock(|when, then| {
        when.method(GET).path("/my/domains/list");
        then.status(200).body(list_page());
    });

    let output = execute(&config(&first, &session_dir), &Command::List).await.unwrap();
    submit.assert();
    assert_eq!(output.stdout, "example.com\nrootcamp.net\n");
    assert!(output.error.is_none());
    assert!(session_dir.path().join(session_file_name("alice")).exists());

    // Cookies ignore the port, so a second server on 127.0.0.1 sees the stored session.
    let second = MockServer::start();
    let resumed = second.mock(|when, then| {
        when.method(GET).path("/my/login").header("cookie", "sid=abc123");
        then.status(200).body(LOGGED_IN);
    });
    let resubmit = second.mock(|when, then| {
        when.method(POST).path("/my/login");
        then.status(200).body(LOGGED_IN);
    });
    second.mock(|when, then| {
        when.method(GET).path("/my/domains/list");
        then.status(200).body(list_page());
    });

    let output = execute(&config(&second, &session_dir), &Command::List).await.unwrap();
    resumed.assert();
    resubmit.assert_hits(0);
    assert_eq!(output.stdout, "example.com\nrootcamp.net\n");
}

#[tokio::test]
async fn test_dump_prints_json_and_reports_failures() {
    let session_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/my/login");
        then.status(200).body(LOGGED_IN);
    });
    server.mock(|when, then| {
        when.method(GET).path("/my/domains/*/com/example/rr/allinone");
        then.status(200).body(
            r#"<html><body><div id="nav"><div class="reb">Ausloggen</div></div>
               <table id="dnszone"><tbody>
                 <tr id="a_1"><td id="rr_1_name">www</td><td id="rr_1_ttl">3600</td>
                   <td id="rr_1_type">CNAME</td><td id="rr_1_data">example.com.</td><td></td></tr>
               </tbody></table></body></html>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/my/domains/*/com/example/contract/");
        then.status(200).body(
            r#"<html><body><div id="nav"><div class="reb">Ausloggen</div></div>
               <table class="datastyle"><tbody>
                 <tr><td>Inhaber:</td><td>Alice</td></tr>
               </tbody></table></body></html>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/my/domains/*/org/other/rr/allinone");
        then.status(302).header("Location", server.url("/my/"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/my/");
        then.status(200).body(LOGGED_IN);
    });

    let command = Command::Domains(vec![DomainName::from("example.com"), DomainName::from("other.org")]);
    let output = execute(&config(&server, &session_dir), &command).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let example = &json["example.com"];
    assert_eq!(example["Name"], "example.com");
    assert_eq!(example["Locator"], "*/com/example/");
    assert_eq!(example["RRs"]["1"]["Rtype"], "CNAME");
    assert_eq!(example["RRs"]["1"]["Rttl"], 3600);
    assert_eq!(example["Contract"]["Inhaber"], "Alice");
    assert!(json.get("other.org").is_none());

    match output.error {
        Some(ScrapeError::Batch { attempted, failures }) => {
            assert_eq!(attempted, 2);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].domain.as_str(), "other.org");
        }
        other => panic!("expected Batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_login_is_fatal() {
    let session_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/my/login");
        then.status(200).body(LOGGED_OUT);
    });
    server.mock(|when, then| {
        when.method(POST).path("/my/login");
        then.status(200)
            .header("Set-Cookie", "attempt=1; Path=/; Max-Age=600")
            .body(LOGGED_OUT);
    });
    let listing = server.mock(|when, then| {
        when.method(GET).path("/my/domains/list");
        then.status(200).body(list_page());
    });

    let err = execute(&config(&server, &session_dir), &Command::All).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Authentication { .. }));
    listing.assert_hits(0);

    // The jar is written back even though the run failed.
    let saved = std::fs::read(session_dir.path().join(session_file_name("alice"))).unwrap();
    let jar = SessionJar::from_json(&saved).unwrap();
    let login_url = url::Url::parse(&server.url("/my/login")).unwrap();
    assert_eq!(jar.get(&login_url, "attempt").as_deref(), Some("1"));
}
