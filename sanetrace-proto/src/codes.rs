//! Numeric code spaces of the protocol and their display names.

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $value:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $($variant = $value,)*
        }

        impl $name {
            /// Value and display name of every known code, in wire order.
            pub const NAMES: &'static [(u32, &'static str)] = &[$(($value, $text),)*];

            /// Returns [`None`] if the value is not a known code.
            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
    };
}

wire_enum! {
    /// Remote procedure selected by the first word of every request.
    pub enum Opcode {
        Init = 0 => "SANE_NET_INIT",
        GetDevices = 1 => "SANE_NET_GET_DEVICES",
        Open = 2 => "SANE_NET_OPEN",
        Close = 3 => "SANE_NET_CLOSE",
        GetOptionDescriptors = 4 => "SANE_NET_GET_OPTION_DESCRIPTORS",
        ControlOption = 5 => "SANE_NET_CONTROL_OPTION",
        GetParameters = 6 => "SANE_NET_GET_PARAMETERS",
        Start = 7 => "SANE_NET_START",
        Cancel = 8 => "SANE_NET_CANCEL",
        Authorize = 9 => "SANE_NET_AUTHORIZE",
        Exit = 10 => "SANE_NET_EXIT",
    }
}

wire_enum! {
    pub enum Status {
        Good = 0 => "SANE_STATUS_GOOD",
        Unsupported = 1 => "SANE_STATUS_UNSUPPORTED",
        Cancelled = 2 => "SANE_STATUS_CANCELLED",
        DeviceBusy = 3 => "SANE_STATUS_DEVICE_BUSY",
        Inval = 4 => "SANE_STATUS_INVAL",
        Eof = 5 => "SANE_STATUS_EOF",
        Jammed = 6 => "SANE_STATUS_JAMMED",
        NoDocs = 7 => "SANE_STATUS_NO_DOCS",
        CoverOpen = 8 => "SANE_STATUS_COVER_OPEN",
        IoError = 9 => "SANE_STATUS_IO_ERROR",
        NoMem = 10 => "SANE_STATUS_NO_MEM",
        AccessDenied = 11 => "SANE_STATUS_ACCESS_DENIED",
    }
}

wire_enum! {
    /// Type of an option value.
    pub enum ValueType {
        Bool = 0 => "SANE_TYPE_BOOL",
        Int = 1 => "SANE_TYPE_INT",
        Fixed = 2 => "SANE_TYPE_FIXED",
        String = 3 => "SANE_TYPE_STRING",
        Button = 4 => "SANE_TYPE_BUTTON",
        Group = 5 => "SANE_TYPE_GROUP",
    }
}

wire_enum! {
    pub enum Unit {
        None = 0 => "SANE_UNIT_NONE",
        Pixel = 1 => "SANE_UNIT_PIXEL",
        Bit = 2 => "SANE_UNIT_BIT",
        Mm = 3 => "SANE_UNIT_MM",
        Dpi = 4 => "SANE_UNIT_DPI",
        Percent = 5 => "SANE_UNIT_PERCENT",
        Microsecond = 6 => "SANE_UNIT_MICROSECOND",
    }
}

wire_enum! {
    /// Discriminant of an option descriptor's constraint block.
    pub enum ConstraintKind {
        None = 0 => "SANE_CONSTRAINT_NONE",
        Range = 1 => "SANE_CONSTRAINT_RANGE",
        WordList = 2 => "SANE_CONSTRAINT_WORD_LIST",
        StringList = 3 => "SANE_CONSTRAINT_STRING_LIST",
    }
}

wire_enum! {
    pub enum Action {
        GetValue = 0 => "SANE_ACTION_GET_VALUE",
        SetValue = 1 => "SANE_ACTION_SET_VALUE",
        SetAuto = 2 => "SANE_ACTION_SET_AUTO",
    }
}

wire_enum! {
    /// Frame format reported in scan parameters.
    pub enum FrameFormat {
        Gray = 0 => "SANE_FRAME_GRAY",
        Rgb = 1 => "SANE_FRAME_RGB",
        Red = 2 => "SANE_FRAME_RED",
        Green = 3 => "SANE_FRAME_GREEN",
        Blue = 4 => "SANE_FRAME_BLUE",
    }
}

/// Display name for a request opcode, with a hex fallback for values outside
/// the known set.
pub fn opcode_name(value: u32) -> String {
    match Opcode::from_u32(value) {
        Some(opcode) => opcode.name().to_string(),
        None => format!("RPC Code: 0x{value:08x}"),
    }
}
