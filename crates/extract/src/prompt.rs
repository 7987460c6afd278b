use ingest::Label;

/// Characters of the document shown to the model for classification.
pub const CLASSIFICATION_PREFIX_CHARS: usize = 250;

const TEXT_PLACEHOLDER: &str = "{text}";

const INVOICE_TEMPLATE: &str = r#"You will receive an Invoice text. Extract the following fields and return them in JSON format:
- vendor (the issuing company or provider)
- amount (total to pay)
- due_date (or null if missing)
- line_items (array of items, each with description and amount)

If a field is missing, return it as null.
Return only a valid JSON object with exactly these fields, no markdown, no explanations.

Invoice text:
{text}
"#;

const CONTRACT_TEMPLATE: &str = r#"You will receive a Contract text. Extract the following fields and return them in JSON format:
- parties (array of the names involved)
- effective_date (when the contract starts)
- termination_date (when the contract ends). If the text describes only a duration (e.g. "24 months from the effective date"), calculate the exact termination date.
- key_terms (list of important clauses or conditions)

If a field is missing, return it as null.
Return only a valid JSON object with exactly these fields, no markdown, no explanations.

Contract text:
{text}
"#;

const EARNINGS_TEMPLATE: &str = r#"You will receive a Report text. Extract the following fields and return them in JSON format:
- reporting_period (e.g. Q1 2025, or date range)
- key_metrics (a dictionary of important financial or operational numbers)
- executive_summary (brief summary or highlights)

If a field is missing, return it as null.
Return only a valid JSON object with exactly these fields, no markdown, no explanations.

Report text:
{text}
"#;

/// First `CLASSIFICATION_PREFIX_CHARS` characters of `text`, on a char boundary.
pub fn classification_excerpt(text: &str) -> &str {
    match text.char_indices().nth(CLASSIFICATION_PREFIX_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_classification_prompt(text: &str) -> String {
    let labels = Label::ALL
        .iter()
        .map(|l| format!("\"{}\"", l))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You will receive a short document excerpt.
Classify it strictly as one of the following JSON values: {labels}.
Only return the single word as a JSON string. For example: "Invoice".

Document excerpt:
{}"#,
        classification_excerpt(text)
    )
}

/// The extraction template bound to `label`.
pub fn extraction_template(label: Label) -> &'static str {
    match label {
        Label::Invoice => INVOICE_TEMPLATE,
        Label::Contract => CONTRACT_TEMPLATE,
        Label::Earnings => EARNINGS_TEMPLATE,
    }
}

/// Render the label's extraction template over the full document text.
pub fn build_extraction_prompt(label: Label, text: &str) -> String {
    extraction_template(label).replacen(TEXT_PLACEHOLDER, text, 1)
}
