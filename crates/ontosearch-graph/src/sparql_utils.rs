//! SPARQL text builders shared by the select and update paths.

pub const ONTO: &str = "http://example.org/ontology#";
pub const RESOURCE: &str = "http://example.org/resource/";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Quote `s` as a SPARQL/N-Triples string literal.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Percent-encode everything outside the RFC 3986 unreserved set so the
/// value can sit in one IRI path segment.
pub fn iri_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

pub fn doc_iri(id: &str) -> String { format!("{RESOURCE}doc/{}", iri_segment(id)) }

pub fn failure_iri(name: &str) -> String { format!("{RESOURCE}failure/{}", iri_segment(name)) }

pub fn procedure_iri(name: &str) -> String { format!("{RESOURCE}procedure/{}", iri_segment(&name.replace(' ', "_"))) }

pub fn onto(term: &str) -> String { format!("{ONTO}{term}") }

/// Candidate selection: every token must appear in the lowercased text.
pub fn build_select_query(tokens: &[String], limit: usize) -> String {
    let filters: String = tokens
        .iter()
        .map(|t| format!("    FILTER(CONTAINS(LCASE(?text), {}))\n", string_literal(&t.to_lowercase())))
        .collect();
    format!(
        "PREFIX onto: <{ONTO}>\nSELECT ?doc ?title ?text WHERE {{\n    ?doc onto:text ?text .\n    ?doc onto:title ?title .\n{filters}}} LIMIT {limit}\n"
    )
}

/// The AND predicate the select query encodes, for local re-checking.
pub fn matches_all_tokens(text: &str, tokens: &[String]) -> bool {
    let haystack = text.to_lowercase();
    tokens.iter().all(|t| haystack.contains(&t.to_lowercase()))
}
