//! Prompt assembly for plan generation.
//!
//! The prompt is a pure function of the request fields and the reference texts retrieved for
//! it. Reference blocks are labelled by their position in the input, so an empty entry leaves a
//! gap in the numbering rather than shifting later blocks.

/// Maximum number of characters kept from each reference text.
pub const REFERENCE_CHAR_LIMIT: usize = 1200;

const REFERENCE_HEADER: &str =
    "\n\n[아래는 유사한 실제 운영계획 사례입니다. 참고해서 더 현실적이고 완성도 높게 작성하세요]\n\n";
const BUDGET_SECTION: &str = ", ### 예산(표로 작성)";

/// Structured inputs for [`build_plan_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    /// School level label, e.g. `초등학교`.
    pub school_level: &'a str,
    /// Plan type label, e.g. `방과후학교`.
    pub plan_type: &'a str,
    /// Free-form keywords embedded verbatim.
    pub keywords: &'a str,
    /// Whether the closing instruction asks for a budget table.
    pub include_budget: bool,
}

/// Build the generation prompt from request fields and optional reference texts.
pub fn build_plan_prompt(input: PromptInput<'_>, reference_texts: &[String]) -> String {
    let PromptInput {
        school_level,
        plan_type,
        keywords,
        include_budget,
    } = input;

    let mut prompt = format!(
        "당신은 대한민국의 유능한 교사입니다. '{school_level} {plan_type}' 운영 계획을 작성해 주세요. 핵심 키워드는 '{keywords}' 입니다."
    );

    if !reference_texts.is_empty() {
        prompt.push_str(REFERENCE_HEADER);
        for (index, text) in reference_texts.iter().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            prompt.push_str(&format!(
                "[사례{}]\n{}\n",
                index + 1,
                truncate_chars(trimmed, REFERENCE_CHAR_LIMIT)
            ));
        }
    }

    let budget = if include_budget { BUDGET_SECTION } else { "" };
    prompt.push_str(&format!(
        "\n출력형식: TITLE: [제목], ### 목적, ### 운영방침, ### 세부 운영 계획{budget}, ### 기대효과 (각 항목별로 구분)\n"
    ));
    prompt
}

/// Number of reference texts that contribute a block to the prompt.
pub fn count_usable_references(reference_texts: &[String]) -> usize {
    reference_texts
        .iter()
        .filter(|text| !text.trim().is_empty())
        .count()
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
