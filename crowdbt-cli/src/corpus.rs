/// Corpus and label file parsing.
///
/// Two corpus formats, auto-detected:
///   JSON: an array of annotators, each an array of `[loser, winner]` pairs:
///          `[[[1, 0], [2, 1]], [[3, 2]]]`
///   Text: one edge per line, `annotator loser winner`, whitespace separated.
///          Blank lines and `#` comments are skipped.
use crowdbt_core::{AnnotatorGraph, Edge};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusParseError {
    #[error("corpus looks like JSON but failed to parse: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Parse a corpus file's content.
pub fn parse_corpus(content: &str) -> Result<Vec<AnnotatorGraph>, CorpusParseError> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        parse_json_corpus(trimmed)
    } else {
        parse_edge_lines(trimmed)
    }
}

fn parse_json_corpus(content: &str) -> Result<Vec<AnnotatorGraph>, CorpusParseError> {
    let annotators: Vec<Vec<Edge>> = serde_json::from_str(content)?;
    Ok(annotators
        .into_iter()
        .map(|edges| edges.into_iter().collect())
        .collect())
}

fn parse_edge_lines(content: &str) -> Result<Vec<AnnotatorGraph>, CorpusParseError> {
    let mut graphs: Vec<AnnotatorGraph> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [annotator, loser, winner] = fields[..] else {
            return Err(CorpusParseError::Line {
                line: line_no,
                message: format!("expected `annotator loser winner`, got {} fields", fields.len()),
            });
        };

        let annotator: usize = annotator.parse().map_err(|_| CorpusParseError::Line {
            line: line_no,
            message: format!("invalid annotator index \"{annotator}\""),
        })?;
        let parse_object = |field: &str| -> Result<i64, CorpusParseError> {
            field.parse().map_err(|_| CorpusParseError::Line {
                line: line_no,
                message: format!("invalid object index \"{field}\""),
            })
        };
        let edge = (parse_object(loser)?, parse_object(winner)?);

        if graphs.len() <= annotator {
            graphs.resize_with(annotator + 1, AnnotatorGraph::new);
        }
        graphs[annotator].insert(edge);
    }

    Ok(graphs)
}

/// Parse labels: a JSON array of strings or plain text, one label per line.
pub fn parse_labels(content: &str) -> Result<Vec<String>, CorpusParseError> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let labels: Vec<String> = serde_json::from_str(trimmed)?;
        Ok(labels.into_iter().map(|s| s.trim().to_string()).collect())
    } else {
        Ok(trimmed.lines().map(|l| l.trim().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_corpus() {
        let corpus = parse_corpus("[[[1, 0], [2, 1], [1, 0]], [[3, 2]]]").unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].len(), 2); // duplicate collapsed
        assert!(corpus[0].contains(&(2, 1)));
        assert!(corpus[1].contains(&(3, 2)));
    }

    #[test]
    fn test_json_corpus_rejects_bad_shape() {
        let err = parse_corpus("[[[1, 0, 5]]]").unwrap_err();
        assert!(matches!(err, CorpusParseError::Json(_)));
    }

    #[test]
    fn test_text_corpus() {
        let content = "\
# annotator loser winner
0 1 0
0 2 1

2 3 2   # gap at annotator 1
";
        let corpus = parse_corpus(content).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus[0].len(), 2);
        assert!(corpus[1].is_empty());
        assert!(corpus[2].contains(&(3, 2)));
    }

    #[test]
    fn test_text_corpus_keeps_negative_indices_for_validation() {
        let corpus = parse_corpus("0 -1 2").unwrap();
        assert!(corpus[0].contains(&(-1, 2)));
    }

    #[test]
    fn test_text_corpus_reports_line_numbers() {
        let err = parse_corpus("0 1 0\n0 1\n").unwrap_err();
        match err {
            CorpusParseError::Line { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse_corpus("x 1 0").unwrap_err();
        assert!(err.to_string().contains("invalid annotator index"));
    }

    #[test]
    fn test_labels() {
        assert_eq!(parse_labels("alpha\n beta \ngamma\n").unwrap(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(parse_labels("[\"a\", \"b\"]").unwrap(), vec!["a", "b"]);
    }
}
