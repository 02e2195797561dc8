//! SI and binary byte-size reference tables.
//!
//! The tables are documentary. The energy formula reads only the raw byte
//! length through [`si_byte_value`] and [`binary_byte_value`]; neither applies
//! a table entry as a scaling factor.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiByteUnit {
    pub name: &'static str,
    pub symbol: &'static str,
    pub power10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryByteUnit {
    pub name: &'static str,
    pub symbol: &'static str,
    pub power2: u32,
    pub approx_bytes: f64,
}

const fn si(name: &'static str, symbol: &'static str, power10: f64) -> SiByteUnit {
    SiByteUnit { name, symbol, power10 }
}

const fn bin(name: &'static str, symbol: &'static str, power2: u32, approx_bytes: f64) -> BinaryByteUnit {
    BinaryByteUnit { name, symbol, power2, approx_bytes }
}

pub static SI_BYTE_UNITS: [SiByteUnit; 24] = [
    si("Quecto", "qB", 1e-30),
    si("Ronto", "rB", 1e-27),
    si("Yocto", "yB", 1e-24),
    si("Zepto", "zB", 1e-21),
    si("Atto", "aB", 1e-18),
    si("Femto", "fB", 1e-15),
    si("Pico", "pB", 1e-12),
    si("Nano", "nB", 1e-9),
    si("Mikro", "µB", 1e-6),
    si("Milli", "mB", 1e-3),
    si("Zenti", "cB", 1e-2),
    si("Dezi", "dB", 1e-1),
    si("Byte", "B", 1e0),
    si("Deka", "daB", 1e1),
    si("Hekto", "hB", 1e2),
    si("Kilo", "kB", 1e3),
    si("Mega", "MB", 1e6),
    si("Giga", "GB", 1e9),
    si("Tera", "TB", 1e12),
    si("Peta", "PB", 1e15),
    si("Exa", "EB", 1e18),
    si("Zetta", "ZB", 1e21),
    si("Yotta", "YB", 1e24),
    si("Quetta", "QB", 1e30),
];

pub static BINARY_BYTE_UNITS: [BinaryByteUnit; 24] = [
    bin("Quectibyte", "QiB", 0, 1.0),
    bin("Rontibyte", "RiB", 10, 1024.0),
    bin("Yoctibyte", "YiB", 20, 1048576.0),
    bin("Zeptibyte", "ZiB", 30, 1073741824.0),
    bin("Attibyte", "AiB", 40, 1099511627776.0),
    bin("Femtoibyte", "FiB", 50, 1125899906842624.0),
    bin("Picoibyte", "PiB", 60, 1152921504606846976.0),
    bin("Nanoibyte", "NiB", 70, 1180591620717411303424.0),
    bin("Microibyte", "µiB", 80, 1208925819614629174706176.0),
    bin("Millibyte", "miB", 90, 1.237e27),
    bin("Centibyte", "ciB", 100, 1.267e30),
    bin("Decibyte", "diB", 110, 1.298e33),
    bin("Byte", "B", 120, 1.330e36),
    bin("Dekibyte", "daiB", 130, 1.363e39),
    bin("Hektibyte", "hiB", 140, 1.398e42),
    bin("Kilobibyte", "KiB", 150, 1.433e45),
    bin("Megabibyte", "MiB", 160, 1.470e48),
    bin("Gigabibyte", "GiB", 170, 1.508e51),
    bin("Terabibyte", "TiB", 180, 1.547e54),
    bin("Petabibyte", "PiBiB", 190, 1.587e57),
    bin("Exbibibyte", "EiBiB", 200, 1.628e60),
    bin("Zebbibyte", "ZiBiB", 210, 1.670e63),
    bin("Yobbibyte", "YiBiB", 220, 1.713e66),
    bin("Quettibyte", "QiBiB", 230, 1.757e69),
];

/// SI byte value of a serialized size: the raw length, 0 for an empty buffer.
pub fn si_byte_value(len: usize) -> f64 {
    if len == 0 {
        0.0
    } else {
        len as f64
    }
}

/// Binary byte value of a serialized size: the raw length, 0 for an empty buffer.
pub fn binary_byte_value(len: usize) -> f64 {
    if len == 0 {
        0.0
    } else {
        len as f64
    }
}
