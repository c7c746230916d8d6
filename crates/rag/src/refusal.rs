/// Fixed reply for questions unrelated to the domain.
pub fn refusal(domain_label: &str) -> String {
    format!(
        "Sorry, the question or image is not related to {}.",
        domain_label
    )
}
