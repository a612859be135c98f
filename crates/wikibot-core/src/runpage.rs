//! Runpage kill switch.
//!
//! A runpage is a document an operator edits to stop a bot. The bot may run
//! only while the page reads `True`, optionally preceded by one comment line
//! such as `<!-- Set to False to stop the bot -->`.

use tracing::{debug, warn};

use crate::error::{BotError, Result};
use crate::store::DocumentStore;

/// Token that enables the bot.
pub const ENABLE_TOKEN: &str = "True";

/// Which runpage to check and whether to honour it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunpageOptions {
    /// Task name; selects `User:<name>/<task>/Run`.
    pub task: String,
    /// Explicit runpage title. Mutually exclusive with `task`.
    pub title: String,
    /// Ignore the page contents and always permit running.
    pub override_check: bool,
}

impl RunpageOptions {
    /// Options for a bot's task-specific runpage.
    pub fn for_task(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    /// Options for an explicit runpage title.
    pub fn for_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Resolve the runpage title for `username`.
pub fn resolve_title(username: &str, task: &str, title: &str) -> Result<String> {
    match (task.is_empty(), title.is_empty()) {
        (false, false) => Err(BotError::ArgumentConflict {
            first: "task",
            second: "title",
        }),
        (_, false) => Ok(title.to_string()),
        (true, true) => Ok(format!("User:{}/Run", username)),
        (false, true) => Ok(format!("User:{}/{}/Run", username, task)),
    }
}

fn is_annotation(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("<!--") && line.ends_with("-->")
}

/// Returns true if a runpage body permits the bot to run.
///
/// At most one leading annotation line is skipped. The remainder, trimmed,
/// must be exactly [`ENABLE_TOKEN`].
pub fn parse_runpage(body: &str) -> bool {
    let rest = match body.split_once('\n') {
        Some((first, rest)) if is_annotation(first) => rest,
        _ => body,
    };
    rest.trim() == ENABLE_TOKEN
}

fn read_runpage<S: DocumentStore + ?Sized>(store: &S, options: &RunpageOptions) -> Result<(String, bool)> {
    let username = if options.title.is_empty() {
        store.username()?
    } else {
        String::new()
    };
    let title = resolve_title(&username, &options.task, &options.title)?;
    let page = store.fetch(&title)?;
    Ok((title, parse_runpage(&page.body)))
}

/// Fetch and evaluate the runpage, failing with [`BotError::RunpageHalt`] if
/// the bot must stop.
///
/// The page is fetched on every call. Under `override_check` the bot is
/// always permitted to run, even when the runpage cannot be read; only
/// conflicting `task` and `title` still fail.
pub fn check_runpage<S: DocumentStore + ?Sized>(store: &S, options: &RunpageOptions) -> Result<()> {
    if !options.task.is_empty() && !options.title.is_empty() {
        return Err(BotError::ArgumentConflict {
            first: "task",
            second: "title",
        });
    }

    if options.override_check {
        match read_runpage(store, options) {
            Ok((_, true)) => {}
            Ok((title, false)) => warn!(%title, "runpage disabled, continuing under override"),
            Err(_) => warn!("runpage unreadable, continuing under override"),
        }
        return Ok(());
    }

    let (title, permitted) = read_runpage(store, options)?;
    if !permitted {
        return Err(BotError::RunpageHalt { title });
    }
    debug!(%title, "runpage permits running");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_resolve_title() {
        assert_eq!(
            resolve_title("LoremIpsum", "", "").unwrap(),
            "User:LoremIpsum/Run"
        );
        assert_eq!(
            resolve_title("LoremIpsum", "Foo", "").unwrap(),
            "User:LoremIpsum/Foo/Run"
        );
        assert_eq!(
            resolve_title("LoremIpsum", "", "User:FooBar/Baz/Bang").unwrap(),
            "User:FooBar/Baz/Bang"
        );
        assert!(matches!(
            resolve_title("LoremIpsum", "Foo", "Bar"),
            Err(BotError::ArgumentConflict { .. })
        ));
    }

    #[test]
    fn test_parse_runpage_true() {
        assert!(parse_runpage("True"));
        assert!(parse_runpage("True\n"));
        assert!(parse_runpage("  True  "));
        assert!(parse_runpage("<!--Set to False to stop the bot-->\nTrue"));
        assert!(parse_runpage("<!-- Set to False to stop the bot -->\r\nTrue\n"));
    }

    #[test]
    fn test_parse_runpage_false() {
        assert!(!parse_runpage("False"));
        assert!(!parse_runpage(""));
        assert!(!parse_runpage("Lorem ipsum"));
        assert!(!parse_runpage("True\nplease stop this bot"));
        assert!(!parse_runpage("Truest"));
        assert!(!parse_runpage("true"));
        assert!(!parse_runpage("<!-- comment only -->"));
        assert!(!parse_runpage("<!-- one -->\n<!-- two -->\nTrue"));
    }

    #[test]
    fn test_check_runpage_uses_resolved_title() {
        let store = MemoryStore::new("LoremIpsum");
        store.insert("User:LoremIpsum/Foo/Run", "True");
        check_runpage(&store, &RunpageOptions::for_task("Foo")).unwrap();

        store.insert("User:LoremIpsum/Run", "True");
        check_runpage(&store, &RunpageOptions::default()).unwrap();

        store.insert("User:FooBar/Baz/Bang", "True");
        check_runpage(&store, &RunpageOptions::for_title("User:FooBar/Baz/Bang")).unwrap();
    }

    #[test]
    fn test_check_runpage_halts() {
        let store = MemoryStore::new("LoremIpsum");
        for body in ["False", "", "Lorem ipsum", "True\nplease stop this bot"] {
            store.insert("Foobar", body);
            let err = check_runpage(&store, &RunpageOptions::for_title("Foobar")).unwrap_err();
            assert!(matches!(err, BotError::RunpageHalt { ref title } if title == "Foobar"));
        }
    }

    #[test]
    fn test_check_runpage_missing_page_halts() {
        let store = MemoryStore::new("LoremIpsum");
        let err = check_runpage(&store, &RunpageOptions::default()).unwrap_err();
        assert!(
            matches!(err, BotError::RunpageHalt { ref title } if title == "User:LoremIpsum/Run")
        );
    }

    #[test]
    fn test_check_runpage_override() {
        let store = MemoryStore::new("LoremIpsum");
        store.insert("Foobar", "False");
        let options = RunpageOptions {
            override_check: true,
            ..RunpageOptions::for_title("Foobar")
        };
        check_runpage(&store, &options).unwrap();
    }

    /// Store whose reads always fail.
    struct UnreachableStore;

    impl DocumentStore for UnreachableStore {
        fn username(&self) -> Result<String> {
            Err(BotError::Store {
                msg: "503".to_string(),
            })
        }

        fn fetch(&self, _title: &str) -> Result<crate::store::Document> {
            Err(BotError::Store {
                msg: "503".to_string(),
            })
        }

        fn commit(
            &self,
            _title: &str,
            _body: &str,
            _options: &crate::store::CommitOptions,
        ) -> Result<()> {
            Err(BotError::Store {
                msg: "503".to_string(),
            })
        }
    }

    #[test]
    fn test_check_runpage_override_store_down() {
        let options = RunpageOptions {
            override_check: true,
            ..RunpageOptions::for_title("X")
        };
        check_runpage(&UnreachableStore, &options).unwrap();

        let options = RunpageOptions {
            override_check: true,
            ..RunpageOptions::default()
        };
        check_runpage(&UnreachableStore, &options).unwrap();
    }

    #[test]
    fn test_check_runpage_store_down_without_override() {
        let err = check_runpage(&UnreachableStore, &RunpageOptions::for_title("X")).unwrap_err();
        assert!(matches!(err, BotError::Store { .. }));
    }

    #[test]
    fn test_check_runpage_override_still_rejects_conflict() {
        let options = RunpageOptions {
            task: "Foo".to_string(),
            title: "Bar".to_string(),
            override_check: true,
        };
        assert!(matches!(
            check_runpage(&MemoryStore::new("LoremIpsum"), &options),
            Err(BotError::ArgumentConflict { .. })
        ));
    }

    #[test]
    fn test_check_runpage_task_and_title_conflict() {
        let store = MemoryStore::new("LoremIpsum");
        let options = RunpageOptions {
            task: "Foo".to_string(),
            title: "Bar".to_string(),
            override_check: false,
        };
        assert!(matches!(
            check_runpage(&store, &options),
            Err(BotError::ArgumentConflict { .. })
        ));
        assert_eq!(store.fetch_count(), 0);
    }

    #[test]
    fn test_check_runpage_refetches_every_call() {
        let store = MemoryStore::new("LoremIpsum");
        store.insert("User:LoremIpsum/Run", "True");
        check_runpage(&store, &RunpageOptions::default()).unwrap();
        store.insert("User:LoremIpsum/Run", "False");
        assert!(check_runpage(&store, &RunpageOptions::default()).is_err());
        assert_eq!(store.fetch_count(), 2);
    }
}
