// The dashboard speaks camelCase; the persistence side and snapshot bundles
// use underscore_case. Translation walks objects and arrays recursively and
// only ever touches keys, never values.

use serde_json::{Map, Value};

/// One documented exception: a key spelled as the domain word for "year"
/// ("año", or plain "year") passes through unchanged in both directions.
/// Keys containing non-ASCII letters are never transliterated either, since
/// the casing conventions only disagree over ASCII.
fn passthrough(key: &str) -> bool {
    key == "year" || key == "año" || !key.is_ascii()
}

fn snake_key(key: &str) -> String {
    if passthrough(key) {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn camel_key(key: &str) -> String {
    if passthrough(key) {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn map_keys(value: &Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(rename(k), map_keys(v, rename));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| map_keys(v, rename)).collect()),
        other => other.clone(),
    }
}

/// camelCase -> underscore_case, recursively over nested objects and arrays.
pub fn keys_to_snake(value: &Value) -> Value {
    map_keys(value, &snake_key)
}

/// underscore_case -> camelCase, recursively over nested objects and arrays.
pub fn keys_to_camel(value: &Value) -> Value {
    map_keys(value, &camel_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_and_camel_single_keys() {
        assert_eq!(snake_key("fechaNacimiento"), "fecha_nacimiento");
        assert_eq!(snake_key("montoPagado"), "monto_pagado");
        assert_eq!(camel_key("fecha_nacimiento"), "fechaNacimiento");
        assert_eq!(camel_key("saldo_pendiente"), "saldoPendiente");
    }

    #[test]
    fn year_and_non_ascii_keys_pass_through() {
        assert_eq!(snake_key("year"), "year");
        assert_eq!(camel_key("year"), "year");
        assert_eq!(snake_key("año"), "año");
        assert_eq!(camel_key("año"), "año");
    }

    #[test]
    fn external_shape_round_trips() {
        let external = json!({ "fecha_nacimiento": "2020-01-01", "año": 2024 });
        let core = keys_to_camel(&external);
        assert_eq!(core, json!({ "fechaNacimiento": "2020-01-01", "año": 2024 }));
        assert_eq!(keys_to_snake(&core), external);
    }

    #[test]
    fn translation_is_recursive_over_objects_and_arrays() {
        let core = json!({
            "estudianteId": "s1",
            "abonos": [
                { "reciboNo": "R-1", "montoPagado": 100000 },
                { "reciboNo": "R-2", "montoPagado": 250000 }
            ],
            "justificacion": { "aprobadoPor": null, "motivo": "enfermedad" }
        });
        let external = keys_to_snake(&core);
        assert_eq!(
            external,
            json!({
                "estudiante_id": "s1",
                "abonos": [
                    { "recibo_no": "R-1", "monto_pagado": 100000 },
                    { "recibo_no": "R-2", "monto_pagado": 250000 }
                ],
                "justificacion": { "aprobado_por": null, "motivo": "enfermedad" }
            })
        );
        assert_eq!(keys_to_camel(&external), core);
    }

    #[test]
    fn values_are_never_touched() {
        let v = json!({ "observacion": "llegóTarde_hoy" });
        assert_eq!(
            keys_to_snake(&v),
            json!({ "observacion": "llegóTarde_hoy" })
        );
    }
}
