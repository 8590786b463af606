use kisan_gateway::prompts;
use kisan_gateway::providers::InlineImage;
use kisan_gateway::validate::{Language, PromptKind, PromptRequest};

fn request(kind: PromptKind, text: &str, language: Language) -> PromptRequest {
    PromptRequest {
        kind,
        text: text.to_string(),
        image: None,
        language,
    }
}

#[test]
fn test_generic_prompt_passes_through() {
    let generate = prompts::build(&request(
        PromptKind::Generic,
        "how much water do walnut saplings need?",
        Language::En,
    ));

    assert!(generate.system.is_none());
    assert_eq!(generate.user_text, "how much water do walnut saplings need?");
    assert!(generate.image.is_none());
    assert!(!generate.json_output);
}

#[test]
fn test_expert_prompt_sets_persona() {
    let generate = prompts::build(&request(
        PromptKind::Expert,
        "when should I prune?",
        Language::En,
    ));

    let system = generate.system.unwrap();
    assert!(system.contains("Zahoor Ahmad"));
    assert!(system.contains("Kashmir Valley"));
    assert!(system.contains("SKUAST-K"));
    assert!(system.contains("primarily in English"));
    assert_eq!(generate.user_text, "when should I prune?");
    assert!(!generate.json_output);
}

#[test]
fn test_expert_persona_follows_language() {
    let urdu = prompts::build(&request(PromptKind::Expert, "q", Language::Ur));
    assert!(urdu.system.unwrap().contains("primarily in Urdu"));

    let hindi = prompts::build(&request(PromptKind::Expert, "q", Language::Hi));
    assert!(hindi.system.unwrap().contains("primarily in Hindi"));
}

#[test]
fn test_diagnosis_request_demands_json() {
    let image = InlineImage {
        mime_type: "image/jpeg".to_string(),
        data: "aGVsbG8=".to_string(),
    };
    let mut request = request(PromptKind::Diagnosis, "", Language::En);
    request.image = Some(image.clone());

    let generate = prompts::build(&request);

    assert!(generate.json_output);
    assert_eq!(generate.image, Some(image));
    assert!(generate.system.is_none());

    // The instruction names the schema the normalizer expects
    assert!(generate.user_text.contains("SKUAST-K"));
    assert!(generate.user_text.contains("diseaseName"));
    assert!(generate.user_text.contains("preventiveMeasures"));
    assert!(generate.user_text.contains("Low/Medium/High"));
}

#[test]
fn test_diagnosis_instruction_follows_language() {
    let generate = prompts::build(&request(PromptKind::Diagnosis, "", Language::Ur));
    assert!(generate.user_text.contains("Urdu script"));
}

#[test]
fn test_deep_expert_names_disease() {
    let generate = prompts::build(&request(
        PromptKind::DeepExpert {
            disease: "Apple Scab".to_string(),
        },
        "",
        Language::En,
    ));

    assert!(generate.user_text.contains("Apple Scab"));
    assert!(generate.user_text.contains("Deep Expert View"));
    assert!(generate.user_text.contains("bio-control"));
    assert!(!generate.json_output);
}

#[test]
fn test_weather_request_shape() {
    let generate = prompts::weather_request("Srinagar");

    assert!(generate.system.is_none());
    assert!(generate.image.is_none());
    assert!(generate.json_output);
    assert!(generate.user_text.contains("Srinagar district"));
    assert!(generate.user_text.contains("temperature"));
    assert!(generate.user_text.contains("condition"));
    assert!(generate.user_text.contains("humidity"));
}
