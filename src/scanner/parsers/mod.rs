//! One module per supported format. Each parser owns its eligibility
//! predicate and emits findings through the shared classifier; read and
//! decode errors are swallowed so a single bad file never aborts a scan.

mod bash;
mod generic;
mod generic_code;
mod golang;
mod json;
mod php;
mod private_key;
mod properties;
mod xml;
mod yaml;
