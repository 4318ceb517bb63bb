//! Instruction text sent to generative backends.
//!
//! The direct backend answers in free text, so the prompt pins down the output
//! contract: a confidence-ordered array of the top 3 candidates with a fixed
//! set of fields, and nothing but that array.

const IDENTIFICATION_PROMPT: &str = r#"You are an expert in identifying tools and equipment.
Analyze the image and return the following information as a JSON array.

Requirements:
1. Provide the top 3 most likely candidates
2. Sort the candidates by confidence, highest first
3. Identify the brand and model name as precisely as possible

JSON format:
[
  {
    "name": "Full product name",
    "brand": "Brand name",
    "model": "Model name",
    "category": "Category (e.g. power tool, hand tool, measuring instrument)",
    "type": "Specific type (e.g. drill, wrench, saw)",
    "confidence": 0.95,
    "description": "Short description"
  }
]

Important: return ONLY the JSON array, with no other text before or after it."#;

pub const EXPECTED_CANDIDATES: usize = 3;

pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "brand",
    "model",
    "category",
    "type",
    "confidence",
    "description",
];

pub fn build_identification_prompt() -> String {
    IDENTIFICATION_PROMPT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_identification_prompt(), build_identification_prompt());
    }

    #[test]
    fn test_prompt_names_every_required_field() {
        let prompt = build_identification_prompt();
        for field in REQUIRED_FIELDS {
            assert!(
                prompt.contains(&format!("\"{}\"", field)),
                "prompt is missing field {}",
                field
            );
        }
        assert!(prompt.contains("top 3"));
        assert!(prompt.contains("ONLY the JSON array"));
    }
}
