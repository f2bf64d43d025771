//! Command-line tokenizer for one dispatch level.
//!
//! Accepts `-name`, `--name`, `-name=value` and `-name value`. Boolean flags
//! never take the next token. Parsing stops at the first positional argument
//! or after a `--` terminator; everything from there on is handed back.

use crate::error::{Error, Result};
use crate::registry::FlagRegistry;

enum Step {
    /// A flag was consumed; continue at the given index.
    Flag(usize),
    /// Stop; positionals start at the given index.
    Stop(usize),
}

impl FlagRegistry {
    /// Apply leading flags from `args` and return the remaining positionals.
    pub fn parse(&self, args: &[String]) -> Result<Vec<String>> {
        let mut i = 0;
        let rest_start = loop {
            match self.parse_one(args, i)? {
                Step::Flag(next) => i = next,
                Step::Stop(start) => break start,
            }
        };
        tracing::trace!(scope = self.scope(), visited = ?self.visited(), "parsed flags");
        Ok(args[rest_start..].to_vec())
    }

    fn parse_one(&self, args: &[String], i: usize) -> Result<Step> {
        let Some(arg) = args.get(i) else {
            return Ok(Step::Stop(i));
        };
        if arg.len() < 2 || !arg.starts_with('-') {
            return Ok(Step::Stop(i));
        }
        if arg == "--" {
            return Ok(Step::Stop(i + 1));
        }

        let body = arg.strip_prefix("--").unwrap_or(&arg[1..]);
        if body.is_empty() || body.starts_with(['-', '=']) {
            return Err(Error::parse(format!("bad flag syntax: {arg}")));
        }
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(is_bool) = self.is_bool_flag(name) else {
            if name == "help" || name == "h" {
                return Err(Error::parse("flag: help requested"));
            }
            return Err(Error::parse(format!("flag provided but not defined: -{name}")));
        };

        if is_bool {
            match inline {
                Some(value) => self.assign(name, value).map_err(|reason| {
                    Error::parse(format!("invalid boolean value {value:?} for -{name}: {reason}"))
                })?,
                None => self
                    .assign(name, "true")
                    .map_err(|reason| Error::parse(format!("invalid boolean flag {name}: {reason}")))?,
            }
            return Ok(Step::Flag(i + 1));
        }

        let (value, next) = match inline {
            Some(value) => (value, i + 1),
            None => match args.get(i + 1) {
                Some(value) => (value.as_str(), i + 2),
                None => return Err(Error::parse(format!("flag needs an argument: -{name}"))),
            },
        };
        self.assign(name, value).map_err(|reason| {
            Error::parse(format!("invalid value {value:?} for flag -{name}: {reason}"))
        })?;
        Ok(Step::Flag(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use crate::source::Environment;

    fn registry(flags: &[Flag]) -> FlagRegistry {
        let env = Environment::fixed(Vec::<(String, String)>::new());
        FlagRegistry::build("test", flags, &env).unwrap()
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn text(reg: &FlagRegistry, name: &str) -> String {
        reg.value(name).unwrap().to_text()
    }

    #[test]
    fn single_and_double_dash_are_equivalent() {
        let reg = registry(&[Flag::string("name", ""), Flag::int("count", 0)]);
        let rest = reg.parse(&argv(&["-name", "Ada", "--count=3", "extra"])).unwrap();
        assert_eq!(rest, ["extra"]);
        assert_eq!(text(&reg, "name"), "Ada");
        assert_eq!(text(&reg, "count"), "3");
        assert_eq!(reg.visited(), ["name", "count"]);
    }

    #[test]
    fn bools_do_not_consume_the_next_token() {
        let reg = registry(&[Flag::bool("verbose"), Flag::bool_t("color")]);
        let rest = reg.parse(&argv(&["--verbose", "false", "--color"])).unwrap();
        assert_eq!(rest, ["false", "--color"]);
        assert_eq!(text(&reg, "verbose"), "true");

        let reg = registry(&[Flag::bool_t("color")]);
        reg.parse(&argv(&["--color=false"])).unwrap();
        assert_eq!(text(&reg, "color"), "false");
    }

    #[test]
    fn parsing_stops_at_first_positional_and_terminator() {
        let reg = registry(&[Flag::bool("v")]);
        let rest = reg.parse(&argv(&["a", "-v"])).unwrap();
        assert_eq!(rest, ["a", "-v"]);
        assert!(!reg.is_visited("v"));

        let rest = reg.parse(&argv(&["-v", "--", "-v", "b"])).unwrap();
        assert_eq!(rest, ["-v", "b"]);

        let rest = reg.parse(&argv(&["-", "-v"])).unwrap();
        assert_eq!(rest, ["-", "-v"]);
    }

    #[test]
    fn value_may_itself_look_like_a_flag() {
        let reg = registry(&[Flag::string("name", ""), Flag::bool("v")]);
        let rest = reg.parse(&argv(&["--name", "-v"])).unwrap();
        assert!(rest.is_empty());
        assert_eq!(text(&reg, "name"), "-v");
    }

    #[test]
    fn accumulators_collect_every_occurrence() {
        let reg = registry(&[Flag::string_slice("tag, t", Vec::<String>::new())]);
        reg.parse(&argv(&["-t", "a", "--tag", "b", "-t=c"])).unwrap();
        assert_eq!(text(&reg, "tag"), "a,b,c");
    }

    #[test]
    fn errors_use_flag_package_wording() {
        let reg = registry(&[Flag::int("count", 0), Flag::bool("v")]);
        let cases = [
            (vec!["--nope"], "flag provided but not defined: -nope"),
            (vec!["--count"], "flag needs an argument: -count"),
            (vec!["---count"], "bad flag syntax: ---count"),
            (vec!["-=x"], "bad flag syntax: -=x"),
            (vec!["-h"], "flag: help requested"),
        ];
        for (args, expected) in cases {
            let err = reg.parse(&argv(&args)).unwrap_err();
            assert_eq!(err.to_string(), expected, "args: {args:?}");
        }

        let err = reg.parse(&argv(&["--count", "many"])).unwrap_err();
        assert!(err.to_string().starts_with("invalid value \"many\" for flag -count: "));
        let err = reg.parse(&argv(&["-v=maybe"])).unwrap_err();
        assert!(err.to_string().starts_with("invalid boolean value \"maybe\" for -v: "));
    }
}
