use log::error;

use crate::errors::*;
use crate::fields::{FieldKey, FieldMap};
use crate::template::{Template, Token};

impl Template {
    const RECOMPOSE: &'static str = "recomposing a line";

    /// Assemble a line from the field values, terminated by `\n`.
    ///
    /// A field referenced by the template but absent from `fields` means the two templates of a
    /// job do not match, so it aborts instead of skipping the line.
    pub fn recompose(&self, fields: &FieldMap) -> Result<String> {
        let mut res = String::new();

        for token in self.tokens() {
            match token {
                Token::Separator(s) => res.push_str(s),
                Token::Field(key) => res.push_str(self.lookup(fields, key)?),
            }
        }

        res.push('\n');
        Ok(res)
    }

    /// Field values in template order, without the separators.
    pub fn recompose_values(&self, fields: &FieldMap) -> Result<Vec<String>> {
        self.keys()
            .map(|key| self.lookup(fields, key).map(str::to_owned))
            .collect()
    }

    fn lookup<'a>(&self, fields: &'a FieldMap, key: &FieldKey) -> Result<&'a str> {
        fields.get(key).ok_or_else(|| {
            error!(
                "Cannot find the {} when {}\nfields:\n{}template: {}",
                key,
                Self::RECOMPOSE,
                fields,
                self
            );
            Error::MissingField {
                key: key.clone(),
                fields: fields.clone(),
                template: self.clone(),
                context: Self::RECOMPOSE,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template;
    use crate::template::Decomposer;

    #[test]
    fn recompose_with_literal_text() {
        let fields = (0..7usize)
            .zip(["chr1", "631539", "631540", "Squires", "id1", "0", "+"])
            .map(|(k, v)| (FieldKey::Index(k), v))
            .collect::<FieldMap>();
        let t = template![0, "\t", 1, "\t", 2, "\tm5C|-|HeLa|22344696\t-\t", 6];

        assert_eq!(
            t.recompose(&fields).unwrap(),
            "chr1\t631539\t631540\tm5C|-|HeLa|22344696\t-\t+\n"
        );
    }

    #[test]
    fn recompose_mixed_key_styles() {
        let mut fields = FieldMap::new();
        fields.insert(FieldKey::name("gene"), "BRCA1");
        fields.insert(FieldKey::Index(2), "17");

        let t = template![2, ":", "{gene}"];
        assert_eq!(t.recompose(&fields).unwrap(), "17:BRCA1\n");
        assert_eq!(t.recompose_values(&fields).unwrap(), vec!["17", "BRCA1"]);
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut fields = FieldMap::new();
        fields.insert(FieldKey::Index(0), "chr1");

        let t = template![0, "\t", "{missing}"];
        match t.recompose(&fields) {
            Err(Error::MissingField { key, template, .. }) => {
                assert_eq!(key, FieldKey::name("missing"));
                assert_eq!(template, t);
            }
            res => panic!("expected a missing field error, got {:?}", res),
        }
        assert!(t.recompose_values(&fields).is_err());
    }

    #[test]
    fn round_trip() {
        let t = template!["{a}", "\t", "{b}", "|", "{c}", ";", "{d}"];
        let d = Decomposer::new(t.clone()).unwrap();

        for line in ["x\ty|z;w\n", "1\t2|3;4;5\n", "long value\tb|c;d\n"] {
            let fields = d.decompose(line);
            assert_eq!(t.recompose(&fields).unwrap(), line);
        }
    }
}
