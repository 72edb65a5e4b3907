use cached::proc_macro::cached;
use opentelemetry::KeyValue;

pub fn increment(name: &'static str, kv: &[(&str, &str)]) {
    counter(name).add(1, &as_attributes(kv))
}

pub fn set(name: &'static str, value: f64, kv: &[(&str, &str)]) {
    gauge(name).record(value, &as_attributes(kv))
}

fn as_attributes(kv: &[(&str, &str)]) -> Vec<KeyValue> {
    kv.iter().map(|(k, v)| KeyValue::new(k.to_string(), v.to_string())).collect()
}

#[cached]
fn counter(name: &'static str) -> opentelemetry::metrics::Counter<u64> {
    opentelemetry::global::meter("emon-automation").u64_counter(name).build()
}

#[cached]
fn gauge(name: &'static str) -> opentelemetry::metrics::Gauge<f64> {
    opentelemetry::global::meter("emon-automation").f64_gauge(name).build()
}
