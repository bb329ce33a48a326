use mailparse::MailAddr;

/// Parse an address header value (`From`, `Cc`, ...) into bare addresses.
///
/// Display names and groups are flattened away. If the value is not valid
/// RFC 5322 it is split on commas instead, so nothing is silently dropped.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let parsed: Vec<String> = match mailparse::addrparse(raw) {
        Ok(list) => list
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(info) => vec![info.addr.clone()],
                MailAddr::Group(group) => group.addrs.iter().map(|i| i.addr.clone()).collect(),
            })
            .collect(),
        Err(e) => {
            log::debug!("address list {raw:?} is not RFC 5322 ({e}); splitting on commas");
            raw.split(',').map(str::to_string).collect()
        }
    };

    let mut out = Vec::with_capacity(parsed.len());
    for addr in parsed {
        push_unique(&mut out, addr.trim());
    }
    out
}

/// Appends `addr` unless it is blank or already present (case-insensitive).
pub fn push_unique(list: &mut Vec<String>, addr: &str) -> bool {
    if addr.is_empty() || list.iter().any(|a| same_address(a, addr)) {
        return false;
    }
    list.push(addr.to_string());
    true
}

pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
