use url::{Host, Url};

/// Two-level public suffixes where the registrable domain is three labels
///
/// Not the full public suffix list; covers the multi-part TLDs most likely to
/// be crawled. Everything else falls back to the last-two-labels rule.
const MULTI_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "net.uk", "co.jp", "ne.jp", "or.jp", "ac.jp",
    "com.au", "net.au", "org.au", "edu.au", "gov.au", "co.nz", "net.nz", "org.nz", "com.br",
    "net.br", "org.br", "co.in", "net.in", "org.in", "co.za", "org.za", "com.mx", "com.cn",
    "net.cn", "org.cn", "com.sg", "com.hk", "co.kr", "or.kr", "com.tw", "com.ar", "com.tr",
];

/// Extracts the registrable domain (ownership boundary) from a URL
///
/// `sub.example.com` and `example.com` both map to `example.com`;
/// `shop.example.co.uk` maps to `example.co.uk`. IP-address hosts are
/// returned verbatim (with port, so two local test servers stay distinct).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitecheck::url::registrable_domain;
///
/// let url = Url::parse("https://blog.example.com/post").unwrap();
/// assert_eq!(registrable_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://shop.example.co.uk/").unwrap();
/// assert_eq!(registrable_domain(&url), Some("example.co.uk".to_string()));
/// ```
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Ipv4(_) | Host::Ipv6(_) => {
            let host = url.host_str()?.to_lowercase();
            Some(match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host,
            })
        }
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            let labels: Vec<&str> = domain.split('.').collect();
            if labels.len() <= 2 {
                return Some(domain);
            }

            let last_two = labels[labels.len() - 2..].join(".");
            let keep = if MULTI_PART_SUFFIXES.contains(&last_two.as_str()) {
                3
            } else {
                2
            };
            Some(labels[labels.len() - keep.min(labels.len())..].join("."))
        }
    }
}

/// Returns true when `url` shares a registrable domain with the seed
///
/// Compared at the registrable-domain boundary, not exact host, so
/// subdomains of the seed count as internal.
pub fn is_internal(url: &Url, seed_domain: &str) -> bool {
    registrable_domain(url).as_deref() == Some(seed_domain)
}
