use serde_json::Value;

use crate::request::AnalysisRequest;

/// Third-party data gathered before prompting. `None` means the lookup was disabled or failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupData {
    pub places: Option<Value>,
    pub whois: Option<Value>,
}

/// Render the request and lookup data into the instruction sent to the completion service.
///
/// Missing optional fields render as empty text and missing lookups as `null`; the
/// downstream model tolerates both.
pub fn build_prompt(request: &AnalysisRequest, lookups: &LookupData) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    format!(
        "Assess the credibility of a business using a deep analysis approach based on the following details:\n\
         Business Name: {name}\n\
         Domain: {domain}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Address: {address}\n\
         Facebook URL: {facebook}\n\
         Instagram URL: {instagram}\n\
         Hashtags: {hashtags}\n\
         \n\
         Google Places Data: {places}\n\
         WHOIS Data: {whois}\n\
         \n\
         {rubric}",
        name = request.business_name,
        domain = request.domain,
        email = field(&request.email),
        phone = field(&request.phone),
        address = field(&request.address),
        facebook = field(&request.facebook_url),
        instagram = field(&request.instagram_url),
        hashtags = field(&request.hashtags),
        places = render_lookup(&lookups.places),
        whois = render_lookup(&lookups.whois),
        rubric = RUBRIC,
    )
}

fn render_lookup(value: &Option<Value>) -> String {
    match value {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()),
        None => "null".to_string(),
    }
}

const RUBRIC: &str = "\
Please assign a credibility score between 1 and 100 to evaluate the trustworthiness of the provided business information. Use the scoring system below to categorize the business:
0-20: Likely a scam.
20-40: Be cautious; potential red flags exist.
40-60: Neutral; insufficient evidence to strongly support or discredit.
60-80: Likely trustworthy with some room for improvement.
80-100: Fully legitimate and credible.

Derive the score by considering the following factors:
- Website analysis (using the WHOIS data)
- Social media presence (Facebook, Instagram)
- Online reviews (using the Google Places data)
- Business details validation (using the WHOIS and Google Places data)

Output:
State the result on its own line as \"Credibility Score: <number>\".
Provide an explanation (max 50 words) describing the reasoning for the score, citing specific findings.
Include relevant business reviews or comments (max 30 words) to support the score.
Write plain text only, without markdown, asterisks or hash characters.
";
