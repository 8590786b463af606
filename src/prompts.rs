use crate::providers::GenerateRequest;
use crate::validate::{Language, PromptKind, PromptRequest};

/// Build the upstream generation request for a validated prompt.
///
/// Each request kind fixes its own instruction text and whether the model is
/// told to reply with strict JSON. The caller's text and image ride along
/// unchanged.
pub fn build(request: &PromptRequest) -> GenerateRequest {
    match &request.kind {
        PromptKind::Generic => GenerateRequest {
            system: None,
            user_text: request.text.clone(),
            image: request.image.clone(),
            json_output: false,
        },
        PromptKind::Expert => GenerateRequest {
            system: Some(expert_system(request.language)),
            user_text: request.text.clone(),
            image: request.image.clone(),
            json_output: false,
        },
        PromptKind::Diagnosis => GenerateRequest {
            system: None,
            user_text: diagnosis_instruction(request.language),
            image: request.image.clone(),
            json_output: true,
        },
        PromptKind::DeepExpert { disease } => GenerateRequest {
            system: None,
            user_text: deep_expert_instruction(disease),
            image: request.image.clone(),
            json_output: false,
        },
    }
}

/// Weather lookups reuse the generation pipeline with a fixed instruction.
pub fn weather_request(city: &str) -> GenerateRequest {
    GenerateRequest {
        system: None,
        user_text: format!(
            "Describe the current weather in {city} district, Jammu and Kashmir, for a \
             farmer's dashboard. Respond strictly with a single JSON object with fields: \
             temperature (string, e.g. \"12°C\"), condition (one word, e.g. Rainy, Cloudy, \
             Sunny), humidity (string percentage, e.g. \"65%\")."
        ),
        image: None,
        json_output: true,
    }
}

fn expert_system(language: Language) -> String {
    format!(
        "You are 'Zahoor Ahmad', a world-class agricultural expert specializing in the \
         Kashmir Valley. {} You help farmers manage their orchards (Apples, Pears, Walnuts, \
         Almonds) and spice fields (Saffron). Your advice is strictly localized to the \
         temperate climate of Jammu & Kashmir and must align with SKUAST-K guidelines. Use \
         a polite, fatherly, and professional tone.",
        speech_line(language)
    )
}

fn diagnosis_instruction(language: Language) -> String {
    format!(
        "Act as a senior pathologist from SKUAST-K (Sher-e-Kashmir University of \
         Agricultural Sciences and Technology). Analyze this plant image for diseases \
         common in Jammu & Kashmir (like Apple Scab, Alternaria, San Jose Scale, Saffron \
         Corm Rot). {} Respond strictly with a single JSON object containing: diseaseName \
         (string), severity (one of Low/Medium/High), confidence (number between 0 and 1), \
         description (clinical signs observed), treatment (list of specific \
         fungicide/pesticide applications used in Kashmir, such as Captan, Mancozeb or \
         Hexaconazole, with dosage per 100L of water), preventiveMeasures (agricultural \
         practices like pruning, sanitation, drainage).",
        script_line(language)
    )
}

fn deep_expert_instruction(disease: &str) -> String {
    format!(
        "You are a world-class AI Agricultural Scientist specializing in Himalayan \
         temperate climates. The previous diagnosis identified this issue as: {disease}. \
         Provide an advanced \"Deep Expert View\" covering: 1. Biological cycle of the \
         pathogen. 2. Specific environmental triggers (micro-climate, humidity thresholds, \
         degree-day models). 3. Advanced bio-control strategies (e.g., Trichoderma viride \
         applications). 4. Long-term orchard management to build resilience. Use scientific \
         yet accessible language. Format with professional Markdown."
    )
}

fn speech_line(language: Language) -> &'static str {
    match language {
        Language::En => {
            "Speak and write primarily in English, but use local Kashmiri/Urdu terms where \
             appropriate."
        }
        Language::Ur => "Speak and write primarily in Urdu (اردو). Help farmers in their native language.",
        Language::Hi => "Speak and write primarily in Hindi (हिंदी). Help farmers in their native language.",
    }
}

fn script_line(language: Language) -> &'static str {
    match language {
        Language::En => "Provide the response in English.",
        Language::Ur => "Provide the response in Urdu script.",
        Language::Hi => "Provide the response in Hindi.",
    }
}
