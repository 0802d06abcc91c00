use crate::address_book;
use crate::config::AppConfig;
use crate::error::Result;
use crate::finder::Finder;
use crate::models::LoginRecord;
use crate::selector::{select_direct, select_interactive};
use crate::ssh_service::{Launcher, SessionExit, SessionRunner};
use crate::table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Host number given on the command line.
    Direct(usize),
    /// Search the table.
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Finished { host: String, exit: SessionExit },
    NoSelection,
}

pub struct App<F, R> {
    config: AppConfig,
    records: Vec<LoginRecord>,
    finder: F,
    launcher: Launcher<R>,
}

impl<F: Finder, R: SessionRunner> App<F, R> {
    pub fn new(config: AppConfig, finder: F, runner: R) -> Result<Self> {
        let records = address_book::load(&config.address_book)?;
        let launcher = Launcher::new(&config, runner);
        Ok(Self {
            config,
            records,
            finder,
            launcher,
        })
    }

    #[cfg(test)]
    pub fn with_launcher(mut self, f: impl FnOnce(Launcher<R>) -> Launcher<R>) -> Self {
        self.launcher = f(self.launcher);
        self
    }

    pub fn records(&self) -> &[LoginRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &Launcher<R> {
        &self.launcher
    }

    pub fn table(&self) -> String {
        table::render(&self.records)
    }

    /// Login script for host number `index`, without running it.
    pub fn script_for(&self, index: usize) -> Result<String> {
        let record = select_direct(&self.records, index, &self.config.address_book)?;
        Ok(self.launcher.script_for(record))
    }

    pub fn run(&mut self, mode: Mode) -> Result<Outcome> {
        let record = match mode {
            Mode::Direct(index) => select_direct(&self.records, index, &self.config.address_book)?,
            Mode::Interactive => match select_interactive(
                &self.records,
                &mut self.finder,
                &self.config.finder,
                &self.config.address_book,
            )? {
                Some(record) => record,
                None => return Ok(Outcome::NoSelection),
            },
        };

        tracing::info!("Selected host: {:?}", record);
        let exit = self.launcher.launch(record)?;
        Ok(Outcome::Finished {
            host: record.name.clone(),
            exit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::Error;
    use crate::finder::FinderOptions;
    use crate::ssh_service::SessionScript;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const BOOK: &str = "\
name|host|user|password|port|comment
work|10.0.0.5|alice|s3cr3t|22|prod box
home|192.168.1.10|bob|hunter2|2222|home lab
";

    /// Picks the body row starting with a given host number.
    struct PickNumber(Option<usize>);

    impl Finder for PickNumber {
        fn find(&mut self, input: &str, options: &FinderOptions) -> Result<Option<String>> {
            Ok(self.0.and_then(|n| {
                input
                    .lines()
                    .skip(options.header_lines)
                    .find(|l| table::parse_index(l) == Some(n))
                    .map(str::to_string)
            }))
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        scripts: Vec<String>,
    }

    impl SessionRunner for RecordingRunner {
        fn run(&mut self, _interpreter: &Path, script: &Path) -> Result<SessionExit> {
            self.scripts.push(fs::read_to_string(script).unwrap());
            Ok(SessionExit { code: Some(0) })
        }
    }

    struct Fixture {
        home: TempDir,
        _bin: TempDir,
        bin_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let home = TempDir::new().unwrap();
            fs::write(home.path().join(".fastsshrc"), BOOK).unwrap();
            let bin = TempDir::new().unwrap();
            let bin_path = bin.path().to_path_buf();
            let expect = bin_path.join("expect");
            fs::write(&expect, "#!/bin/sh\n").unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&expect, fs::Permissions::from_mode(0o755)).unwrap();
            }
            Self {
                home,
                _bin: bin,
                bin_path,
            }
        }

        fn config(&self) -> AppConfig {
            AppConfig::resolve(self.home.path(), &Settings::default(), None)
        }

        fn app(&self, pick: Option<usize>) -> App<PickNumber, RecordingRunner> {
            let search = self.bin_path.clone().into_os_string();
            App::new(self.config(), PickNumber(pick), RecordingRunner::default())
                .unwrap()
                .with_launcher(|l| l.with_search_path(Some(search)))
        }
    }

    fn bob() -> LoginRecord {
        LoginRecord::new("home", "192.168.1.10", "bob", "hunter2", "2222", "home lab")
    }

    #[test]
    fn direct_mode_launches_the_numbered_host() {
        let fixture = Fixture::new();
        let mut app = fixture.app(None);

        let outcome = app.run(Mode::Direct(2)).unwrap();
        assert_eq!(
            outcome,
            Outcome::Finished {
                host: "home".to_string(),
                exit: SessionExit { code: Some(0) },
            }
        );

        let scripts = &app.launcher().runner().scripts;
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0], SessionScript::new(&bob(), 30).render());
        assert!(scripts[0].contains("spawn ssh -p2222 -l bob 192.168.1.10\n"));
        assert!(scripts[0].contains("send -- \"hunter2\\r\"\n"));
        assert!(!fixture.config().script_path.exists());
    }

    #[test]
    fn direct_mode_out_of_range_names_index_and_path() {
        let fixture = Fixture::new();
        let mut app = fixture.app(None);

        let err = app.run(Mode::Direct(3)).unwrap_err();
        assert!(matches!(err, Error::Range { index: 3, .. }));
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains(&fixture.config().address_book.display().to_string()));
        assert!(app.launcher().runner().scripts.is_empty());
    }

    #[test]
    fn interactive_mode_matches_direct_mode() {
        let fixture = Fixture::new();
        for n in 1..=2 {
            let mut searched = fixture.app(Some(n));
            let mut direct = fixture.app(None);
            assert_eq!(
                searched.run(Mode::Interactive).unwrap(),
                direct.run(Mode::Direct(n)).unwrap()
            );
            assert_eq!(
                searched.launcher().runner().scripts,
                direct.launcher().runner().scripts
            );
        }
    }

    #[test]
    fn aborted_search_is_no_selection() {
        let fixture = Fixture::new();
        let mut app = fixture.app(None);
        assert_eq!(app.run(Mode::Interactive).unwrap(), Outcome::NoSelection);
        assert!(app.launcher().runner().scripts.is_empty());
    }

    #[test]
    fn repeated_launches_write_identical_scripts() {
        let fixture = Fixture::new();
        let mut app = fixture.app(None);
        app.run(Mode::Direct(1)).unwrap();
        app.run(Mode::Direct(1)).unwrap();
        let scripts = &app.launcher().runner().scripts;
        assert_eq!(scripts[0], scripts[1]);
    }

    #[test]
    fn script_for_does_not_touch_the_disk() {
        let fixture = Fixture::new();
        let app = fixture.app(None);
        let script = app.script_for(1).unwrap();
        assert!(script.contains("spawn ssh -p22 -l alice 10.0.0.5"));
        assert!(!fixture.config().script_path.exists());
        assert!(app.script_for(0).is_err());
    }

    #[test]
    fn table_lists_every_record() {
        let fixture = Fixture::new();
        let app = fixture.app(None);
        assert_eq!(app.records().len(), 2);
        assert_eq!(app.table().lines().count(), 4);
    }

    #[test]
    fn missing_address_book_is_a_config_error() {
        let home = TempDir::new().unwrap();
        let config = AppConfig::resolve(home.path(), &Settings::default(), None);
        let err = App::new(config, PickNumber(None), RecordingRunner::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }
}
