//! Prompts for tender field extraction and question answering.
//!
//! Every prompt lives here so extraction behaviour can be changed in one
//! place, and so tests can inspect the prompt text without calling a model.

/// Field names the extraction prompt asks for, in report order.
pub const TENDER_FIELDS: &[&str] = &[
    "Tender_Reference",
    "Issuing_Authority",
    "Project_Name",
    "Location",
    "Estimated_Value",
    "EMD_Amount",
    "Tender_Fee",
    "Important_Dates",
    "Eligibility",
    "Scope_of_Work",
    "Contract_Period",
    "Payment_Terms",
    "Technical_Specifications",
    "Submission_Method",
    "Contact_Details",
    "Required_Documents",
    "Executive_Summary",
];

/// System prompt for extracting tender fields from document text or page
/// images. The model must answer with a single JSON object.
pub const EXTRACTION_PROMPT: &str = r#"You are a senior tender analyst specialised in government and PSU procurement documents.
Read the ENTIRE document carefully before extracting any data.

RULES
1. No assumptions. Extract only what the document states. If a value is unclear or partially visible, say so.
2. References. When the text says "Refer to Para X", "As per Clause Y" or "See Annexure Z", search the whole
   document (Para/Paragraph, Clause/Section, Annexure/Appendix/Schedule; NIT, GCC/SCC, technical specs, BOQ,
   annexures, tables, footnotes, headers) and extract the actual value. If it cannot be found, write exactly:
   "Referenced in <reference> but details not found in extracted text".
3. Write "Not Specified" only when there is no value, no reference and no implied criteria.
4. Conflicts. Prefer Special Conditions, then Technical Specifications, then NIT, then GCC. Mention unresolved conflicts.
5. Normalisation. Dates as DD-MM-YYYY, times as HH:mm (24-hour). Keep currency as written (₹ / Rs / INR / %).
   Do not convert amounts.

ELIGIBILITY
Extract complete criteria: amount, time period, financial years, nature of work, quantity or value thresholds.
Merge criteria split across clauses into one complete requirement.

FIELDS (strict JSON)
Tender_Reference (string)
Issuing_Authority (string)
Project_Name (string)
Location (string)
Estimated_Value (string)
EMD_Amount (string)
Tender_Fee (string)
Important_Dates (object: every date with its exact label from the document)
Eligibility (object with keys):
  Min_Turnover (string: amount, period, financial years)
  Experience_Required (string: years, nature of work)
  Other_Eligibility_Criteria (string)
Scope_of_Work (string, at most 200 characters: 2-3 bullet points or one sentence)
Contract_Period (string)
Payment_Terms (string, at most 150 characters)
Technical_Specifications (string, at most 250 characters, key points only)
Submission_Method (string)
Contact_Details (string)
Required_Documents (array: every certificate, affidavit, form and annexure)
Executive_Summary (string, 3-5 sentences: what is procured, value and duration, key eligibility, submission mode)

OUTPUT
Output ONLY valid JSON. No markdown, no explanations, no comments, no backticks.
Preserve the document's wording wherever possible."#;

/// User-turn preamble placed before page images when the document has no
/// extractable text.
pub const VISION_PREAMBLE: &str =
    "The attached images are the first pages of a scanned tender document. Extract the fields.";

/// Build the question-answering prompt around a JSON summary of the tender.
pub fn ask_prompt(context_json: &str, question: &str) -> String {
    format!(
        "You are a helpful expert assistant for a government tender document.\n\
         Here is the JSON summary of the tender document:\n\
         {context_json}\n\n\
         Question: {question}\n\n\
         Answer the question concisely based strictly on the provided context. \
         If the answer is not in the context, say so."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_names_every_field() {
        for field in TENDER_FIELDS {
            assert!(EXTRACTION_PROMPT.contains(field), "missing {field}");
        }
        assert!(EXTRACTION_PROMPT.contains("Min_Turnover"));
        assert!(EXTRACTION_PROMPT.contains("Other_Eligibility_Criteria"));
    }

    #[test]
    fn ask_prompt_embeds_context_and_question() {
        let p = ask_prompt(r#"{"EMD_Amount":"Rs 1 lakh"}"#, "What is the EMD?");
        assert!(p.contains(r#"{"EMD_Amount":"Rs 1 lakh"}"#));
        assert!(p.contains("Question: What is the EMD?"));
        assert!(p.contains("say so"));
    }
}
