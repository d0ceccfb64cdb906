use std::fmt;
use std::str::FromStr;

use crate::clean::Predicate;
use crate::errors::*;
use crate::fields::FieldKey;
use crate::template::{RawToken, Template};

const GFF3_HEAD: [&str; 15] = [
    "{seqid}", "\t", "{source}", "\t", "{type}", "\t", "{start}", "\t", "{end}", "\t", "{score}",
    "\t", "{strand}", "\t", "{phase}",
];

/// Predefined templates for known annotation formats, each restricted to one feature type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardTemplate {
    /// Ensembl GFF3 gene lines.
    Gff3EnsGene,
    /// Ensembl GTF gene lines.
    GtfEnsGene,
    /// Ensembl GFF3 transcript lines.
    Gff3EnsTranscript,
}

impl StandardTemplate {
    pub const ALL: [StandardTemplate; 3] = [
        StandardTemplate::Gff3EnsGene,
        StandardTemplate::GtfEnsGene,
        StandardTemplate::Gff3EnsTranscript,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StandardTemplate::Gff3EnsGene => "gff3_ens_gene",
            StandardTemplate::GtfEnsGene => "gtf_ens_gene",
            StandardTemplate::Gff3EnsTranscript => "gff3_ens_transcript",
        }
    }

    /// The feature type kept by the template.
    pub fn feature_type(&self) -> &'static str {
        match self {
            StandardTemplate::Gff3EnsGene | StandardTemplate::GtfEnsGene => "gene",
            StandardTemplate::Gff3EnsTranscript => "transcript",
        }
    }

    pub fn init_template(&self) -> Template {
        let attrs: &[&str] = match self {
            StandardTemplate::Gff3EnsGene => &[
                "\tID=", "{ID}",
                ";gene_id=", "{gene_id}",
                ";gene_type=", "{gene_type}",
                ";gene_status=", "{gene_status}",
                ";gene_name=", "{gene_name}",
                ";level=", "{level}",
                ";havana_gene=", "{havana_gene}",
            ],
            StandardTemplate::GtfEnsGene => &[
                "\tgene_id \"", "{gene_id}",
                "\"; gene_type \"", "{gene_type}",
                "\"; gene_status \"", "{gene_status}",
                "\"; gene_name \"", "{gene_name}",
                "\"; level ", "{level}",
                "; havana_gene \"", "{havana_gene}",
            ],
            StandardTemplate::Gff3EnsTranscript => &[
                "\tID=", "{ID}",
                ";Parent=", "{Parent}",
                ";gene_id=", "{gene_id}",
                ";transcript_id=", "{transcript_id}",
                ";gene_type=", "{gene_type}",
                ";gene_status=", "{gene_status}",
                ";gene_name=", "{gene_name}",
                ";transcript_type=", "{transcript_type}",
                ";transcript_status=", "{transcript_status}",
                ";transcript_name=", "{transcript_name}",
                ";level=", "{level}",
                ";transcript_support_level=", "{transcript_support_level}",
                ";tag=", "{tag}",
                ";havana_gene=", "{havana_gene}",
                ";havana_transcript=", "{havana_transcript}",
            ],
        };

        // the token lists above are fixed and well formed
        Template::new(GFF3_HEAD.iter().chain(attrs).map(|&s| RawToken::from(s)))
            .unwrap_or_else(|e| panic!("Error in the {} template: {e}", self.name()))
    }

    /// Keeps only the lines of the template's feature type.
    pub fn predicate(&self) -> Predicate {
        Predicate::Equals {
            key: FieldKey::name("type"),
            value: self.feature_type().to_owned(),
        }
    }
}

impl FromStr for StandardTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StandardTemplate::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownStandardTemplate(s.to_owned()))
    }
}

impl fmt::Display for StandardTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Decomposer;

    #[test]
    fn all_templates_compile() {
        for t in StandardTemplate::ALL {
            Decomposer::new(t.init_template()).unwrap();
            assert_eq!(t.name().parse::<StandardTemplate>().unwrap(), t);
        }
        assert!("bed6".parse::<StandardTemplate>().is_err());
    }

    #[test]
    fn gtf_gene_line() {
        let d = Decomposer::new(StandardTemplate::GtfEnsGene.init_template()).unwrap();
        let line = "chr1\tHAVANA\tgene\t11869\t14409\t.\t+\t.\t\
            gene_id \"ENSG00000223972.5\"; gene_type \"transcribed_unprocessed_pseudogene\"; \
            gene_status \"KNOWN\"; gene_name \"DDX11L1\"; level 2; \
            havana_gene \"OTTHUMG00000000961.2\";\n";
        let fields = d.decompose(line);

        assert_eq!(fields.get(&FieldKey::name("type")), Some("gene"));
        assert_eq!(fields.get(&FieldKey::name("gene_id")), Some("ENSG00000223972.5"));
        assert_eq!(fields.get(&FieldKey::name("gene_name")), Some("DDX11L1"));
        assert_eq!(fields.get(&FieldKey::name("level")), Some("2"));
        assert_eq!(
            fields.get(&FieldKey::name("havana_gene")),
            Some("OTTHUMG00000000961.2\";")
        );
        assert!(StandardTemplate::GtfEnsGene.predicate().eval(&fields));
    }

    #[test]
    fn gff3_transcript_predicate() {
        let d = Decomposer::new(StandardTemplate::Gff3EnsTranscript.init_template()).unwrap();
        let fields = d.decompose("chr1\tHAVANA\tgene\t11869\t14409\t.\t+\t.\tID=ENSG1\n");
        assert!(!StandardTemplate::Gff3EnsTranscript.predicate().eval(&fields));
    }
}
