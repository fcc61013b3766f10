use rand::Rng;

const CHROME_VERSIONS: [&str; 12] = [
    "133.0.6943.88",
    "133.0.6943.60",
    "132.0.6834.110",
    "132.0.6834.83",
    "131.0.6778.108",
    "131.0.6778.85",
    "130.0.6723.117",
    "129.0.6668.89",
    "128.0.6613.138",
    "127.0.6533.119",
    "126.0.6478.182",
    "125.0.6422.176",
];

const FIREFOX_VERSIONS: [&str; 8] = [
    "133.0", "132.0", "131.0", "130.0", "129.0", "128.0", "127.0", "126.0",
];

const EDGE_VERSIONS: [&str; 6] = [
    "133.0.3048.56",
    "132.0.2957.63",
    "131.0.2903.112",
    "130.0.2849.80",
    "129.0.2792.65",
    "128.0.2739.90",
];

/// 只用桌面版的 OS 字串，珠寶商網站對行動版會回傳不同的版面
const DESKTOP_OS_STRINGS: [&str; 10] = [
    "Windows NT 10.0; Win64; x64",
    "Windows NT 10.0; Win64; x64",
    "Windows NT 11.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 13_6_9",
    "Macintosh; Intel Mac OS X 14_7_2",
    "Macintosh; Intel Mac OS X 15_2",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
    "X11; Fedora; Linux x86_64",
];

fn pick<'a>(items: &[&'a str]) -> &'a str {
    let mut rng = rand::rng();
    items[rng.random_range(0..items.len())]
}

fn gen_chrome_ua() -> String {
    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        pick(&DESKTOP_OS_STRINGS),
        pick(&CHROME_VERSIONS)
    )
}

fn gen_firefox_ua() -> String {
    let version = pick(&FIREFOX_VERSIONS);
    format!(
        "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
        pick(&DESKTOP_OS_STRINGS),
        version,
        version
    )
}

fn gen_edge_ua() -> String {
    let version = pick(&EDGE_VERSIONS);
    let os = pick(&DESKTOP_OS_STRINGS[..7]);
    let chrome_ver = version.split('.').next().unwrap_or("133");

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36 Edg/{}",
        os, chrome_ver, version
    )
}

pub fn gen_random_ua() -> String {
    let choice = rand::rng().random_range(0..10);
    match choice {
        0..=5 => gen_chrome_ua(),  // 60% Chrome
        6..=7 => gen_firefox_ua(), // 20% Firefox
        _ => gen_edge_ua(),        // 20% Edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ua_formats() {
        for _ in 0..100 {
            let ua = gen_random_ua();
            assert!(ua.starts_with("Mozilla/5.0"), "UA should start with Mozilla/5.0: {}", ua);
            assert!(!ua.contains("Mobile"), "UA should be a desktop one: {}", ua);
        }
    }

    #[test]
    fn test_edge_ua_uses_desktop_os() {
        let ua = gen_edge_ua();
        assert!(ua.contains("Edg/"));
        assert!(!ua.contains("Linux"));
    }
}
