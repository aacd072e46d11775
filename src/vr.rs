//! Value representations and their encoding rules.

/// An enum type for a DICOM value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// URI/URL
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
}

impl VR {
    /// Decode a two-byte VR code as it appears in an explicit-VR stream.
    pub fn from_bytes(bytes: [u8; 2]) -> Option<VR> {
        use VR::*;
        match &bytes {
            b"AE" => Some(AE),
            b"AS" => Some(AS),
            b"AT" => Some(AT),
            b"CS" => Some(CS),
            b"DA" => Some(DA),
            b"DS" => Some(DS),
            b"DT" => Some(DT),
            b"FL" => Some(FL),
            b"FD" => Some(FD),
            b"IS" => Some(IS),
            b"LO" => Some(LO),
            b"LT" => Some(LT),
            b"OB" => Some(OB),
            b"OD" => Some(OD),
            b"OF" => Some(OF),
            b"OL" => Some(OL),
            b"OW" => Some(OW),
            b"PN" => Some(PN),
            b"SH" => Some(SH),
            b"SL" => Some(SL),
            b"SQ" => Some(SQ),
            b"SS" => Some(SS),
            b"ST" => Some(ST),
            b"TM" => Some(TM),
            b"UC" => Some(UC),
            b"UI" => Some(UI),
            b"UL" => Some(UL),
            b"UN" => Some(UN),
            b"UR" => Some(UR),
            b"US" => Some(US),
            b"UT" => Some(UT),
            _ => None,
        }
    }

    pub fn as_bytes(self) -> [u8; 2] {
        use VR::*;
        *match self {
            AE => b"AE",
            AS => b"AS",
            AT => b"AT",
            CS => b"CS",
            DA => b"DA",
            DS => b"DS",
            DT => b"DT",
            FL => b"FL",
            FD => b"FD",
            IS => b"IS",
            LO => b"LO",
            LT => b"LT",
            OB => b"OB",
            OD => b"OD",
            OF => b"OF",
            OL => b"OL",
            OW => b"OW",
            PN => b"PN",
            SH => b"SH",
            SL => b"SL",
            SQ => b"SQ",
            SS => b"SS",
            ST => b"ST",
            TM => b"TM",
            UC => b"UC",
            UI => b"UI",
            UL => b"UL",
            UN => b"UN",
            UR => b"UR",
            US => b"US",
            UT => b"UT",
        }
    }

    /// Whether the explicit-VR encoding of this VR uses a 2-byte length field.
    ///
    /// Per PS3.5 7.1.2, AE, AS, AT, CS, DA, DS, DT, FL, FD, IS, LO, LT, PN, SH,
    /// SL, SS, ST, TM, UI, UL and US carry a 16-bit length right after the VR
    /// code; all other VRs have 2 reserved bytes followed by a 32-bit length.
    pub fn has_short_length(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS
                | AT
                | CS
                | DA
                | DS
                | DT
                | FL
                | FD
                | IS
                | LO
                | LT
                | PN
                | SH
                | SL
                | SS
                | ST
                | TM
                | UI
                | UL
                | US
        )
    }

    /// Whether values of this VR are character data.
    pub fn is_text(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// The byte used to pad an odd-length value to even length:
    /// space for text VRs, NUL for UI and binary VRs.
    pub fn pad_byte(self) -> u8 {
        match self {
            VR::UI => 0x00,
            vr if vr.is_text() => b' ',
            _ => 0x00,
        }
    }
}

impl std::fmt::Display for VR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.as_bytes();
        write!(f, "{}{}", bytes[0] as char, bytes[1] as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_round_trip() {
        for vr in [VR::AE, VR::CS, VR::OB, VR::SQ, VR::UI, VR::UN, VR::UT] {
            assert_eq!(VR::from_bytes(vr.as_bytes()), Some(vr));
        }
    }

    #[test]
    fn test_from_bytes_unknown() {
        assert_eq!(VR::from_bytes(*b"ZZ"), None);
        assert_eq!(VR::from_bytes(*b"ae"), None);
    }

    #[test]
    fn test_length_form() {
        assert!(VR::CS.has_short_length());
        assert!(VR::UI.has_short_length());
        assert!(VR::US.has_short_length());
        assert!(!VR::OB.has_short_length());
        assert!(!VR::SQ.has_short_length());
        assert!(!VR::UN.has_short_length());
        assert!(!VR::UT.has_short_length());
    }

    #[test]
    fn test_pad_byte() {
        assert_eq!(VR::PN.pad_byte(), b' ');
        assert_eq!(VR::CS.pad_byte(), b' ');
        assert_eq!(VR::UI.pad_byte(), 0x00);
        assert_eq!(VR::OB.pad_byte(), 0x00);
    }

    #[test]
    fn test_display() {
        assert_eq!(VR::PN.to_string(), "PN");
        assert_eq!(VR::SQ.to_string(), "SQ");
    }
}
