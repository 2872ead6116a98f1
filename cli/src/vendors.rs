use std::sync::OnceLock;

use mac_oui::Oui;
use pnet::util::MacAddr;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB.get_or_init(|| Oui::default().ok()).as_ref()
}

/// Manufacturer registered for the MAC's OUI, if the bundled database knows it.
pub fn vendor_of(mac: MacAddr) -> Option<String> {
    let db = get_oui_db()?;
    match db.lookup_by_mac(&mac.to_string()) {
        Ok(Some(entry)) => Some(entry.company_name.clone()),
        _ => None,
    }
}
