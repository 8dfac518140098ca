/// Binary prefixes, largest last
const SI2: [(f64, &str); 9] = [
    (1.0, ""),
    (1024.0, "Ki"),
    (1_048_576.0, "Mi"),
    (1_073_741_824.0, "Gi"),
    (1_099_511_627_776.0, "Ti"),
    (1_125_899_906_842_624.0, "Pi"),
    (1_152_921_504_606_846_976.0, "Ei"),
    (1_180_591_620_717_411_303_424.0, "Zi"),
    (1_208_925_819_614_629_174_706_176.0, "Yi"),
];

/// `1536` -> `1.5 Ki`, three significant characters, integer part kept whole
fn si2(x: f64) -> String {
    let (scale, prefix) = SI2
        .iter()
        .rev()
        .find(|(scale, _)| x >= *scale)
        .unwrap_or(&SI2[0]);
    let full = format!("{:.3}", x / scale);
    let int_len = full.find('.').unwrap_or(full.len());
    let mut digits = full[..full.len().min(int_len.max(3))].to_owned();
    if digits.contains('.') {
        let trimmed = digits.trim_end_matches('0');
        if let Some(int) = trimmed.strip_suffix('.') {
            digits = int.to_owned();
        }
    }
    format!("{digits} {prefix}")
}

pub fn size_si(bytes: f64) -> String {
    format!("{}B", si2(bytes))
}

pub fn throughput_si(bytes_per_sec: f64) -> String {
    format!("{}B/s", si2(bytes_per_sec))
}

/// `0.125` -> `12 %`
pub fn percentage(ratio: f64) -> String {
    format!("{:.0} %", ratio * 100.0)
}
