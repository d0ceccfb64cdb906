//! Reformatting jobs described in YAML.
//!
//! ```yaml
//! init_template: [0, "\t", 1, "\t", 2, "\t", 3, "|", 4, "\t", 5, "\t", 6]
//! final_format: "{0}\t{1}\t{2}\tm5C|-|HeLa|22344696\t-\t{6}"
//! filters:
//!   0: [chr2, chr4]
//! substitutions:
//!   "{strand}": {".": "+"}
//! require:
//!   - field: 5
//!     matches: "^[0-9]+$"
//! ```

use log::warn;
use rustc_hash::FxHashMap;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use std::fmt;

use crate::clean::{CleanConfig, Predicate};
use crate::errors::*;
use crate::fields::{FieldKey, RawKey};
use crate::reformat::Reformatter;
use crate::template::{RawToken, StandardTemplate, Template};

/// Any YAML scalar read as text, so `chr: 1` and `chr: "1"` mean the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_owned()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// One entry of the `require` list. Exactly one condition must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequireConfig {
    pub field: RawKey,
    pub equals: Option<Scalar>,
    pub one_of: Option<Vec<Scalar>>,
    pub matches: Option<String>,
}

impl RequireConfig {
    fn to_predicate(&self) -> Result<Predicate> {
        let key = FieldKey::from(self.field.clone());

        match (&self.equals, &self.one_of, &self.matches) {
            (Some(value), None, None) => Ok(Predicate::Equals {
                key,
                value: value.0.clone(),
            }),
            (None, Some(values), None) => Ok(Predicate::OneOf {
                key,
                values: values.iter().map(|v| v.0.clone()).collect(),
            }),
            (None, None, Some(pattern)) => Predicate::matches(key, pattern),
            _ => Err(Error::InvalidConfig(format!(
                "requirement on {} needs exactly one of \"equals\", \"one_of\" or \"matches\"",
                key
            ))),
        }
    }
}

/// A reformatting job. Missing entries take the defaults of [`ReformatConfig::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReformatConfig {
    pub init_template: Option<Vec<RawToken>>,
    pub init_format: Option<String>,
    pub standard_template: Option<String>,
    pub final_template: Option<Vec<RawToken>>,
    pub final_format: Option<String>,
    pub header: Option<String>,
    pub keep_original_header: bool,
    pub header_from_final_template: bool,
    pub replace_internal_space: Option<String>,
    pub replace_null: Option<String>,
    pub substitutions: FxHashMap<RawKey, FxHashMap<Scalar, Scalar>>,
    pub filters: FxHashMap<RawKey, Vec<Scalar>>,
    pub require: Vec<RequireConfig>,
    pub comment_marker: Option<String>,
}

impl Default for ReformatConfig {
    fn default() -> Self {
        Self {
            init_template: None,
            init_format: None,
            standard_template: None,
            final_template: None,
            final_format: None,
            header: None,
            keep_original_header: true,
            header_from_final_template: false,
            replace_internal_space: Some("_".to_owned()),
            replace_null: Some("*".to_owned()),
            substitutions: FxHashMap::default(),
            filters: FxHashMap::default(),
            require: Vec::new(),
            comment_marker: Some("#".to_owned()),
        }
    }
}

impl ReformatConfig {
    pub fn from_file(file: impl AsRef<str>) -> Result<Self> {
        let file = file.as_ref();
        let text = std::fs::read_to_string(file).map_err(|e| Error::FileIo {
            file: file.to_owned(),
            source: e,
        })?;
        Self::parse(&text, file)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Self::parse(text, "<string>")
    }

    fn parse(text: &str, file: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::ParseConfig {
            file: file.to_owned(),
            source: e,
        })
    }

    /// Compile the job into a [`Reformatter`].
    pub fn build(&self) -> Result<Reformatter> {
        let given = [
            self.init_template.is_some(),
            self.init_format.is_some(),
            self.standard_template.is_some(),
        ];
        if given.iter().filter(|&&g| g).count() != 1 {
            return Err(Error::InvalidConfig(
                "exactly one of \"init_template\", \"init_format\" or \"standard_template\" \
                 is required"
                    .to_owned(),
            ));
        }
        if self.final_template.is_some() && self.final_format.is_some() {
            return Err(Error::InvalidConfig(
                "\"final_template\" and \"final_format\" cannot both be given".to_owned(),
            ));
        }

        let mut res = if let Some(raw) = &self.init_template {
            Reformatter::new(Template::new(raw.iter().cloned())?)?
        } else if let Some(format) = &self.init_format {
            Reformatter::new(Template::parse_format(format)?)?
        } else if let Some(name) = &self.standard_template {
            Reformatter::from_standard(name.parse::<StandardTemplate>()?)?
        } else {
            return Err(Error::InvalidConfig("no initial template".to_owned()));
        };

        if let Some(raw) = &self.final_template {
            res = res.with_final_template(Template::new(raw.iter().cloned())?);
        } else if let Some(format) = &self.final_format {
            res = res.with_final_template(Template::parse_format(format)?);
        }

        let clean = self.clean_config()?;
        let known = res.init_template().keys().cloned().collect::<Vec<_>>();
        let referenced = clean
            .substitutions
            .keys()
            .chain(clean.filters.keys())
            .chain(clean.predicates.iter().filter_map(Predicate::key));
        for key in referenced {
            if !known.contains(key) {
                warn!("The configuration refers to {}, which is not in the initial template", key);
            }
        }

        res = res
            .clean(clean)
            .keep_original_header(self.keep_original_header)
            .header_from_final_template(self.header_from_final_template)
            .comment_marker(self.comment_marker.clone());
        if let Some(header) = &self.header {
            res = res.header(header.clone());
        }

        Ok(res)
    }

    fn clean_config(&self) -> Result<CleanConfig> {
        let mut res = CleanConfig::new();
        res.replace_null = self.replace_null.clone();
        res.replace_internal_space = self.replace_internal_space.clone();

        for (key, table) in &self.substitutions {
            for (from, to) in table {
                res = res.substitute(FieldKey::from(key.clone()), from.0.clone(), to.0.clone());
            }
        }
        for (key, values) in &self.filters {
            res = res.filter_out(FieldKey::from(key.clone()), values.iter().map(|v| v.0.clone()));
        }
        for r in &self.require {
            res = res.require(r.to_predicate()?);
        }

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BED_JOB: &str = r#"
init_template: [0, "\t", 1, "\t", 2, "\t", 3, "|", 4, "\t", 5, "\t", 6]
final_template: [0, "\t", 1, "\t", 2, "\tm5C|-|HeLa|22344696\t-\t", 6]
filters:
  0: [chr2, chr4]
"#;

    fn run(config: &ReformatConfig, input: &str) -> String {
        let r = config.build().unwrap();
        let mut out = Vec::new();
        r.run(input.as_bytes(), Some(&mut out)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn defaults() {
        let c = ReformatConfig::from_yaml("init_format: \"{0},{1}\"").unwrap();
        assert!(c.keep_original_header);
        assert!(!c.header_from_final_template);
        assert_eq!(c.replace_internal_space.as_deref(), Some("_"));
        assert_eq!(c.replace_null.as_deref(), Some("*"));
        assert_eq!(c.comment_marker.as_deref(), Some("#"));
    }

    #[test]
    fn bed_job() {
        let c = ReformatConfig::from_yaml(BED_JOB).unwrap();
        let out = run(
            &c,
            "chr1\t631539\t631540\tSquires|id1\t0\t+\nchr2\t1\t2\tLi|id2\t0\t-\n",
        );
        assert_eq!(out, "chr1\t631539\t631540\tm5C|-|HeLa|22344696\t-\t+\n");
    }

    #[test]
    fn named_keys_and_scalars() {
        let c = ReformatConfig::from_yaml(
            r#"
init_format: "{chrom}\t{pos}\t{strand}"
final_format: "{chrom}:{pos}{strand}"
substitutions:
  "{chrom}": {1: chr1}
  strand: {".": "+"}
require:
  - field: pos
    matches: "^[0-9]+$"
replace_null: null
"#,
        )
        .unwrap();

        assert_eq!(
            run(&c, "1\t10\t.\n2\tx\t-\n3\t\t-\n"),
            "chr1:10+\n"
        );
    }

    #[test]
    fn standard_template_job() {
        let c = ReformatConfig::from_yaml(
            "standard_template: gtf_ens_gene\nfinal_format: \"{gene_id}\\t{gene_name}\"\n",
        )
        .unwrap();
        let input = "chr1\tHAVANA\tgene\t11869\t14409\t.\t+\t.\tgene_id \"ENSG1\"; \
gene_type \"lncRNA\"; gene_status \"KNOWN\"; gene_name \"DDX11L1\"; level 2; \
havana_gene \"OTTHUMG1\";\n\
chr1\tHAVANA\texon\t11869\t12227\t.\t+\t.\tgene_id \"ENSG1\";\n";
        assert_eq!(run(&c, input), "ENSG1\tDDX11L1\n");
    }

    #[test]
    fn invalid_jobs() {
        assert!(matches!(
            ReformatConfig::from_yaml("init_format: \"{0}\"\nbogus: 1"),
            Err(Error::ParseConfig { .. })
        ));
        assert!(matches!(
            ReformatConfig::from_yaml("final_format: \"{0}\"").unwrap().build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ReformatConfig::from_yaml("init_format: \"{0}\"\nstandard_template: gff3_ens_gene")
                .unwrap()
                .build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ReformatConfig::from_yaml("standard_template: bed_gene").unwrap().build(),
            Err(Error::UnknownStandardTemplate(_))
        ));
        assert!(matches!(
            ReformatConfig::from_yaml(
                "init_format: \"{0}\"\nrequire:\n  - field: 0\n    equals: a\n    matches: b\n"
            )
            .unwrap()
            .build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.yaml");
        std::fs::write(&path, BED_JOB).unwrap();

        let c = ReformatConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(c.filters.len(), 1);
        assert!(ReformatConfig::from_file(dir.path().join("nope.yaml").to_str().unwrap()).is_err());
    }
}
