use crate::gemini::GeminiGenerationConfig;

/// Fixed instruction sent with every image. Not configurable: the exact
/// wording is part of the behavioral contract. Downstream consumers rely on
/// the `[?]` and `[unreadable]` markers and on the labeled prescription
/// fields.
pub const TRANSCRIPTION_PROMPT: &str = "You are an expert at reading handwritten text, cursive writing, signatures, and doctor prescriptions.

Please transcribe ALL the text you can see in this image. Follow these rules:
1. Read every word carefully, even if handwriting is very messy
2. Write exactly what is written — do not change anything
3. Keep the same structure with line breaks
4. For unclear words: write best guess + [?]
5. For completely unreadable parts: write [unreadable]
6. If this is a MEDICAL PRESCRIPTION, clearly label:
   Patient Name: ...
   Date: ...
   Medicines & Dosage: ...
   Instructions: ...
   Doctor Name: ...

Output ONLY the transcribed text, nothing else. No explanations.";

/// Deterministic-leaning sampling with a bounded output, matching the fixed
/// parameters of the transcription contract.
pub fn generation_config() -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        temperature: 0.1,
        max_output_tokens: 4096,
    }
}
