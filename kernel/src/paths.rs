// Document Path Layout
//
// Per-survey files live under the site's data directory:
//   src/_data/{survey-id}-answers.json
//   src/_data/{survey-id}-question.json
// Survey ids come from URLs and are validated before they reach a
// store path.

pub const DATA_DIR: &str = "src/_data";

/// Errors produced while resolving a survey id to a store path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("survey id is empty")]
    Empty,

    #[error("survey id `{0}` contains a path separator")]
    Separator(String),
}

fn validate(survey_id: &str) -> Result<&str, PathError> {
    if survey_id.is_empty() {
        return Err(PathError::Empty);
    }
    if survey_id.contains('/') || survey_id.contains('\\') || survey_id.contains("..") {
        return Err(PathError::Separator(survey_id.to_string()));
    }
    Ok(survey_id)
}

/// Store path of a survey's answer document.
pub fn answers_path(survey_id: &str) -> Result<String, PathError> {
    let id = validate(survey_id)?;
    Ok(format!("{DATA_DIR}/{id}-answers.json"))
}

/// Store path of a survey's question metadata file.
pub fn question_path(survey_id: &str) -> Result<String, PathError> {
    let id = validate(survey_id)?;
    Ok(format!("{DATA_DIR}/{id}-question.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_data_dir_layout() {
        assert_eq!(
            answers_path("k7f2p").unwrap(),
            "src/_data/k7f2p-answers.json"
        );
        assert_eq!(
            question_path("k7f2p").unwrap(),
            "src/_data/k7f2p-question.json"
        );
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(answers_path("").unwrap_err(), PathError::Empty);
    }

    #[test]
    fn traversal_attempts_are_rejected() {
        assert!(matches!(
            answers_path("../secrets").unwrap_err(),
            PathError::Separator(_)
        ));
        assert!(matches!(
            question_path("a/b").unwrap_err(),
            PathError::Separator(_)
        ));
    }
}
