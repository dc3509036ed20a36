use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// The user's choices on the mock-exam setup screen: how many items of each
/// type, scoped to a certification and optionally a topic.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = at_least_one_item))]
pub struct StartSessionRequest {
    #[validate(range(max = 120))]
    pub mc_count: u32,
    #[validate(range(max = 20))]
    pub case_count: u32,
    #[validate(range(max = 20))]
    pub interactive_count: u32,
    #[validate(nested)]
    pub filters: ContentFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContentFilters {
    #[validate(length(min = 1))]
    pub certification: String,
    pub topic: Option<String>,
}

fn at_least_one_item(request: &StartSessionRequest) -> Result<(), ValidationError> {
    if request.mc_count + request.case_count + request.interactive_count == 0 {
        return Err(ValidationError::new("empty_session"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_item_session_is_rejected() {
        let request = StartSessionRequest {
            mc_count: 0,
            case_count: 0,
            interactive_count: 0,
            filters: ContentFilters {
                certification: "cpa-20".to_string(),
                topic: None,
            },
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn blank_certification_is_rejected() {
        let request = StartSessionRequest {
            mc_count: 10,
            case_count: 0,
            interactive_count: 0,
            filters: ContentFilters {
                certification: String::new(),
                topic: None,
            },
        };
        assert!(request.validate().is_err());
    }
}
