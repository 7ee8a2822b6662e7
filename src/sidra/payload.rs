//! Decode an API payload (JSON array or XML) into string-keyed rows.
//!
//! Which format arrives depends on the endpoint's mood; the schema, not the
//! format, is the contract.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

const XML_ROW_ELEMENT: &[u8] = b"ValorDescritoPorSuasDimensoes";

/// Rows plus the column set in first-seen order.
pub struct DecodedPayload {
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Decode a response body, sniffing JSON by its first non-blank byte and
/// falling back to the XML shape.
pub fn decode_payload(text: &str) -> Result<DecodedPayload> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        decode_json(text)
    } else {
        decode_xml(text)
    }
}

fn decode_json(text: &str) -> Result<DecodedPayload> {
    let parsed: serde_json::Value =
        serde_json::from_str(text).context("payload is not valid JSON")?;
    let serde_json::Value::Array(items) = parsed else {
        bail!("JSON payload is not an array of rows");
    };

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let serde_json::Value::Object(map) = item else {
            bail!("JSON payload row is not an object");
        };
        let mut row = BTreeMap::new();
        for (key, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            if !columns.iter().any(|c| *c == key) {
                columns.push(key.clone());
            }
            row.insert(key, text);
        }
        rows.push(row);
    }
    Ok(DecodedPayload { columns, rows })
}

/// Event-loop over `<ValorDescritoPorSuasDimensoes>` elements; each child
/// element becomes a column.
fn decode_xml(text: &str) -> Result<DecodedPayload> {
    let mut reader = quick_xml::Reader::from_str(text);
    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    let mut current: Option<BTreeMap<String, String>> = None;
    let mut current_key: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == XML_ROW_ELEMENT {
                    current = Some(BTreeMap::new());
                } else if current.is_some() {
                    current_key =
                        Some(String::from_utf8_lossy(name.as_ref()).into_owned());
                }
            }
            Ok(quick_xml::events::Event::Text(e)) => {
                if let (Some(row), Some(key)) = (current.as_mut(), current_key.as_ref()) {
                    let value = e.unescape()?.into_owned();
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                    row.entry(key.clone())
                        .and_modify(|v| v.push_str(&value))
                        .or_insert(value);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == XML_ROW_ELEMENT {
                    if let Some(row) = current.take() {
                        rows.push(row);
                    }
                } else {
                    current_key = None;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e).context("payload is not valid XML"),
            _ => {}
        }
        buf.clear();
    }

    if rows.is_empty() && columns.is_empty() {
        bail!("XML payload has no row elements");
    }
    Ok(DecodedPayload { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array() {
        let body = r#"[
            {"D1C":"Brasil (Código)","D2C":"Variável (Código)","D3C":"Mês (Código)","V":"Valor"},
            {"D1C":"1","D2C":"63","D3C":"202601","V":"0.52"}
        ]"#;
        let decoded = decode_payload(body).unwrap();
        assert_eq!(decoded.rows.len(), 2);
        assert_eq!(decoded.rows[1].get("D3C").map(String::as_str), Some("202601"));
        assert!(decoded.columns.iter().any(|c| c == "V"));
    }

    #[test]
    fn json_numeric_values_stringified() {
        let body = r#"[{"D1C":"1","V":6454.48}]"#;
        let decoded = decode_payload(body).unwrap();
        assert_eq!(decoded.rows[0].get("V").map(String::as_str), Some("6454.48"));
    }

    #[test]
    fn xml_rows() {
        let body = r#"<?xml version="1.0"?>
            <Raiz>
              <ValorDescritoPorSuasDimensoes>
                <D1C>1</D1C><D1N>Brasil</D1N>
                <D2C>63</D2C><D3C>202601</D3C><V>0.52</V>
              </ValorDescritoPorSuasDimensoes>
              <ValorDescritoPorSuasDimensoes>
                <D1C>1</D1C><D2C>63</D2C><D3C>202602</D3C><V>0.55</V>
              </ValorDescritoPorSuasDimensoes>
            </Raiz>"#;
        let decoded = decode_payload(body).unwrap();
        assert_eq!(decoded.rows.len(), 2);
        assert_eq!(decoded.rows[0].get("D1N").map(String::as_str), Some("Brasil"));
        assert_eq!(decoded.rows[1].get("D3C").map(String::as_str), Some("202602"));
        assert_eq!(decoded.columns[0], "D1C");
    }

    #[test]
    fn garbage_fails() {
        assert!(decode_payload("<html>login required</html>").is_err());
        assert!(decode_payload("{\"not\": \"an array\"}").is_err());
    }
}
