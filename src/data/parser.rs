use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;

use crate::data::document::CorpusDocument;
use crate::data::memory::{CorpusBuilder, MemoryCorpus};
use crate::types::{FeatureValue, ValueType};

/// Loads corpus documents from JSON or gzipped JSON.
pub struct CorpusParser;

impl CorpusParser {
    /// Parse a JSON file (regular or gzipped)
    pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<MemoryCorpus> {
        let path = file_path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open corpus file {}", path.display()))?;

        // Check if file is gzipped by looking at magic bytes
        let mut reader = BufReader::new(file);
        let mut magic = [0u8; 2];
        let gzipped = reader.read_exact(&mut magic).is_ok() && magic == [0x1f, 0x8b];

        let file = File::open(path)?;
        let document = if gzipped {
            Self::parse_reader(BufReader::new(GzDecoder::new(file)))
        } else {
            Self::parse_reader(BufReader::new(file))
        }
        .with_context(|| format!("Cannot parse corpus file {}", path.display()))?;

        log::info!(
            "Loaded corpus {}: {} slots, {} composite nodes",
            path.display(),
            document.max_slot,
            document.nodes.len()
        );
        Self::build(document)
    }

    pub fn parse_reader<R: Read>(mut reader: BufReader<R>) -> Result<CorpusDocument> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<CorpusDocument> {
        let document: CorpusDocument = serde_json::from_str(content)?;
        Ok(document)
    }

    /// Turn a parsed document into an in-memory corpus.
    pub fn build(document: CorpusDocument) -> Result<MemoryCorpus> {
        let mut builder = CorpusBuilder::new(&document.slot_type, document.max_slot);
        for node in &document.nodes {
            builder.add_node(&node.otype, &node.slots);
        }
        for (name, feature) in document.node_features {
            for (node, value) in feature.values {
                builder.set_feature(&name, node, coerce(&name, value, feature.value_type)?);
            }
        }
        for (name, feature) in document.edge_features {
            builder.declare_edge_feature(&name, feature.values, Some(feature.value_type));
            for edge in feature.edges {
                let (from, to, value) = edge.into_parts();
                let value = match value {
                    Some(v) if feature.values => Some(coerce(&name, v, feature.value_type)?),
                    Some(_) => {
                        log::warn!("Edge feature '{}' has no values; ignoring value on {}->{}", name, from, to);
                        None
                    }
                    None => None,
                };
                builder.add_edge(&name, from, to, value);
            }
        }
        Ok(builder.build()?)
    }
}

/// Bring a JSON value in line with the declared feature type.
fn coerce(feature: &str, value: FeatureValue, value_type: ValueType) -> Result<FeatureValue> {
    match (value, value_type) {
        (FeatureValue::Str(s), ValueType::Int) => s
            .trim()
            .parse::<i64>()
            .map(FeatureValue::Int)
            .map_err(|_| anyhow!("Feature '{}' is declared int but has value '{}'", feature, s)),
        (FeatureValue::Int(i), ValueType::Str) => Ok(FeatureValue::Str(i.to_string())),
        (value, _) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{EdgeDirection, FeatureProvider};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "slot_type": "word",
        "max_slot": 3,
        "nodes": [
            {"otype": "phrase", "slots": [1, 2]},
            {"otype": "sentence", "slots": [1, 2, 3]}
        ],
        "node_features": {
            "text": {"type": "str", "values": {"1": "in", "2": "the", "3": "beginning"}},
            "number": {"type": "int", "values": {"4": "1", "5": 2}}
        },
        "edge_features": {
            "mother": {"edges": [[1, 4], [2, 4]]},
            "distance": {"values": true, "type": "int", "edges": [[1, 3, 2]]}
        }
    }"#;

    #[test]
    fn test_parse_document() {
        let corpus = CorpusParser::build(CorpusParser::parse_str(SAMPLE).unwrap()).unwrap();
        assert_eq!(corpus.max_node(), 5);
        assert_eq!(corpus.node_type(5), Some("sentence"));
        assert_eq!(corpus.node_feature_value("text", 3), Some(&FeatureValue::Str("beginning".into())));
        assert_eq!(corpus.node_feature_value("number", 4), Some(&FeatureValue::Int(1)));
        assert_eq!(corpus.edge_feature_targets("mother", 4, EdgeDirection::Backward).len(), 2);
        assert_eq!(
            corpus.edge_feature_targets("distance", 1, EdgeDirection::Forward),
            vec![(3, Some(&FeatureValue::Int(2)))]
        );
    }

    #[test]
    fn test_parse_plain_and_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("corpus.json");
        std::fs::write(&plain, SAMPLE).unwrap();
        let corpus = CorpusParser::parse_file(&plain).unwrap();
        assert_eq!(corpus.max_slot(), 3);

        let gz = dir.path().join("corpus.json.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        let corpus = CorpusParser::parse_file(&gz).unwrap();
        assert_eq!(corpus.nodes_of_type("phrase"), vec![4]);
    }

    #[test]
    fn test_bad_int_value() {
        let json = r#"{"slot_type": "w", "max_slot": 1,
            "node_features": {"n": {"type": "int", "values": {"1": "x"}}}}"#;
        let result = CorpusParser::build(CorpusParser::parse_str(json).unwrap());
        assert!(result.is_err());
    }
}
