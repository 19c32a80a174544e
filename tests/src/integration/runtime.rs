//! # Runtime Flow
//!
//! Configuration file to interactive commands, over the in-memory ledger.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use app_runtime::{execute, AppConfig, AppRuntime, Command, Outcome, RuntimeError};
    use asset_client::ClientError;

    const CONFIG: &str = r#"
user = "alice"

[chaincode]
mode = "net"
path = "github.com/example/asset_management"

[security]
chain_key = "0707070707070707070707070707070707070707070707070707070707070707"

[[membership.users]]
username = "alice"
secret = "alice-secret"

[[membership.users]]
username = "bob"
secret = "bob-secret"

[[identities]]
role = "alice"
username = "alice"
secret = "alice-secret"

[[identities]]
role = "bob"
username = "bob"
secret = "bob-secret"
"#;

    struct Fixture {
        runtime: AppRuntime,
        _seed: tempfile::NamedTempFile,
    }

    fn start() -> Fixture {
        let (config, seed) = load(CONFIG);
        Fixture {
            runtime: AppRuntime::bootstrap(&config, true).unwrap(),
            _seed: seed,
        }
    }

    fn load(document: &str) -> (AppConfig, tempfile::NamedTempFile) {
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        writeln!(seed, "100;Picasso").unwrap();
        writeln!(seed, "200;Monet").unwrap();

        let mut config_file = tempfile::NamedTempFile::new().unwrap();
        write!(config_file, "{document}").unwrap();

        let mut config = AppConfig::from_file(config_file.path()).unwrap();
        config.assets.seed_file = seed.path().to_path_buf();
        (config, seed)
    }

    async fn run(runtime: &AppRuntime, line: &str) -> Result<Outcome, RuntimeError> {
        execute(runtime, line.parse::<Command>().unwrap()).await
    }

    fn output(outcome: Outcome) -> String {
        match outcome {
            Outcome::Output(text) => text,
            Outcome::Exit => panic!("unexpected exit"),
        }
    }

    #[tokio::test]
    async fn test_command_session() {
        let fixture = start();
        let runtime = &fixture.runtime;

        assert_eq!(output(run(runtime, "whoami").await.unwrap()), "alice (alice)");
        assert_eq!(
            output(run(runtime, "assets").await.unwrap()),
            "100  Picasso\n200  Monet"
        );

        assert!(output(run(runtime, "deploy").await.unwrap()).starts_with("Deployed program "));
        assert_eq!(output(run(runtime, "owner 100").await.unwrap()), "100 has no owner");

        let assigned = output(run(runtime, "assign 100 bob").await.unwrap());
        assert!(assigned.starts_with("Assigned 100 to bob"));
        assert_eq!(output(run(runtime, "owner 100").await.unwrap()), "100 is owned by bob");

        assert_eq!(run(runtime, "exit").await.unwrap(), Outcome::Exit);
    }

    #[tokio::test]
    async fn test_confidential_session() {
        let fixture = start();
        let runtime = &fixture.runtime;

        assert_eq!(
            output(run(runtime, "confidentiality on").await.unwrap()),
            "Confidentiality on"
        );
        run(runtime, "deploy").await.unwrap();
        run(runtime, "assign 200 alice").await.unwrap();

        assert_eq!(output(run(runtime, "owner 200").await.unwrap()), "200 is owned by alice");
    }

    #[tokio::test]
    async fn test_assign_before_deploy_fails() {
        let fixture = start();

        assert!(matches!(
            run(&fixture.runtime, "assign 100 bob").await,
            Err(RuntimeError::Client(ClientError::ProgramNotDeployed))
        ));
    }

    #[test]
    fn test_presented_secret_must_match_membership_table() {
        let (head, _) = CONFIG.rsplit_once("secret = \"bob-secret\"").unwrap();
        let (config, _seed) = load(&format!("{head}secret = \"guessed\"\n"));

        assert!(matches!(
            AppRuntime::bootstrap(&config, true),
            Err(RuntimeError::Client(ClientError::Registration { .. }))
        ));
    }

    #[tokio::test]
    async fn test_confidentiality_refused_without_chain_key() {
        let document = CONFIG.replace("[security]\nchain_key", "[security]\n# chain_key");
        let (config, _seed) = load(&document);
        let runtime = AppRuntime::bootstrap(&config, true).unwrap();

        assert!(matches!(
            run(&runtime, "confidentiality on").await,
            Err(RuntimeError::MissingChainKey)
        ));
        assert_eq!(
            output(run(&runtime, "confidentiality off").await.unwrap()),
            "Confidentiality off"
        );
        assert!(!runtime.session().confidentiality().is_enabled());
    }
}
