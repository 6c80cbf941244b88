//! Language baselines of browserslist targets.

use browserslist::{resolve, Distrib, Opts};
use std::fmt;

use crate::error::SfcError;

/// Yearly ECMAScript editions, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EsLevel {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
}

impl EsLevel {
    /// Newest edition the lowering passes know about.
    pub const LATEST: EsLevel = EsLevel::Es2022;

    const ABOVE_ES5: [EsLevel; 8] = [
        EsLevel::Es2015,
        EsLevel::Es2016,
        EsLevel::Es2017,
        EsLevel::Es2018,
        EsLevel::Es2019,
        EsLevel::Es2020,
        EsLevel::Es2021,
        EsLevel::Es2022,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EsLevel::Es5 => "ES5",
            EsLevel::Es2015 => "ES2015",
            EsLevel::Es2016 => "ES2016",
            EsLevel::Es2017 => "ES2017",
            EsLevel::Es2018 => "ES2018",
            EsLevel::Es2019 => "ES2019",
            EsLevel::Es2020 => "ES2020",
            EsLevel::Es2021 => "ES2021",
            EsLevel::Es2022 => "ES2022",
        }
    }

    /// Edition fully supported by one browser release.
    ///
    /// Engines missing from the support table are assumed to stop at ES5.
    pub fn of_release(browser: &str, version: &str) -> EsLevel {
        let Some((_, thresholds)) = SUPPORT.iter().find(|(name, _)| *name == browser) else {
            return EsLevel::Es5;
        };
        let Some(version) = parse_version(version) else {
            return EsLevel::Es5;
        };

        let supported = thresholds.iter().take_while(|min| version >= **min).count();
        match supported {
            0 => EsLevel::Es5,
            n => Self::ABOVE_ES5[n - 1],
        }
    }

    /// The newest edition every resolved release supports.
    pub fn of_distribs(distribs: &[Distrib]) -> EsLevel {
        distribs
            .iter()
            .map(|d| Self::of_release(d.name(), d.version()))
            .min()
            .unwrap_or(Self::LATEST)
    }

    /// Resolve browserslist queries to their common edition.
    ///
    /// No queries means no constraint.
    pub fn resolve(queries: &[String]) -> Result<EsLevel, SfcError> {
        if queries.is_empty() {
            return Ok(Self::LATEST);
        }

        let opts = Opts {
            mobile_to_desktop: true,
            ..Opts::default()
        };
        let distribs = resolve(queries, &opts).map_err(|e| SfcError::InvalidTargets {
            query: queries.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self::of_distribs(&distribs))
    }
}

impl fmt::Display for EsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First release with complete support of ES2015 through ES2022, per engine.
const SUPPORT: &[(&str, [(u32, u32); 8])] = &[
    ("chrome", CHROMIUM),
    ("and_chr", CHROMIUM),
    ("android", CHROMIUM),
    ("edge", [(15, 0), (15, 0), (16, 0), (79, 0), (79, 0), (80, 0), (85, 0), (94, 0)]),
    ("firefox", GECKO),
    ("and_ff", GECKO),
    ("safari", WEBKIT),
    ("ios_saf", WEBKIT),
    ("opera", OPERA),
    ("op_mob", OPERA),
    ("samsung", [(5, 0), (6, 0), (7, 0), (9, 0), (11, 0), (13, 0), (14, 0), (17, 0)]),
    ("node", [(6, 0), (7, 0), (8, 0), (10, 0), (12, 0), (14, 0), (15, 0), (16, 11)]),
];

const CHROMIUM: [(u32, u32); 8] = [(51, 0), (52, 0), (58, 0), (64, 0), (73, 0), (80, 0), (85, 0), (94, 0)];
const GECKO: [(u32, u32); 8] = [(54, 0), (54, 0), (55, 0), (78, 0), (78, 0), (80, 0), (80, 0), (93, 0)];
const WEBKIT: [(u32, u32); 8] = [(10, 0), (10, 1), (11, 0), (12, 0), (12, 1), (14, 0), (14, 1), (16, 4)];
const OPERA: [(u32, u32); 8] = [(38, 0), (39, 0), (45, 0), (51, 0), (60, 0), (67, 0), (71, 0), (80, 0)];

/// `major.minor` of a caniuse version such as `15.2-15.3` or `TP`.
fn parse_version(version: &str) -> Option<(u32, u32)> {
    if version == "TP" {
        return Some((u32::MAX, 0));
    }
    let first = version.split('-').next()?;
    let mut parts = first.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn level(queries: &[&str]) -> EsLevel {
        let queries: Vec<String> = queries.iter().map(|q| q.to_string()).collect();
        EsLevel::resolve(&queries).unwrap()
    }

    #[test]
    fn legacy_engine_pins_es5() {
        assert_eq!(level(&["last 2 versions", "ie >= 9"]), EsLevel::Es5);
        assert_eq!(level(&["ie 11"]), EsLevel::Es5);
    }

    #[test]
    fn modern_engines_reach_latest() {
        assert_eq!(level(&["chrome 100"]), EsLevel::LATEST);
        assert_eq!(level(&["chrome 100", "firefox 100"]), EsLevel::LATEST);
    }

    #[test]
    fn oldest_release_decides() {
        assert_eq!(level(&["chrome 100", "safari 10"]), EsLevel::Es2015);
        assert_eq!(level(&["chrome 60"]), EsLevel::Es2017);
    }

    #[test]
    fn no_queries_mean_no_constraint() {
        assert_eq!(EsLevel::resolve(&[]).unwrap(), EsLevel::LATEST);
    }

    #[test]
    fn unknown_queries_are_rejected() {
        let result = EsLevel::resolve(&["definitely not a browser 99".to_string()]);

        assert!(matches!(result, Err(SfcError::InvalidTargets { .. })));
    }

    #[test]
    fn unknown_engines_stop_at_es5() {
        assert_eq!(EsLevel::of_release("op_mini", "all"), EsLevel::Es5);
        assert_eq!(EsLevel::of_release("kaios", "3.1"), EsLevel::Es5);
    }

    #[test]
    fn reads_caniuse_version_ranges() {
        assert_eq!(parse_version("15.2-15.3"), Some((15, 2)));
        assert_eq!(parse_version("109"), Some((109, 0)));
        assert_eq!(parse_version("all"), None);
        assert_eq!(EsLevel::of_release("safari", "TP"), EsLevel::LATEST);
        assert_eq!(EsLevel::of_release("ios_saf", "10.0-10.2"), EsLevel::Es2015);
    }
}
