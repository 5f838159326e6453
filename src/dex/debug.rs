/// Entry in a method's debug info state machine
///
/// String and type references are raw pool indices; `None` is the "no index" sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DebugItem {
    StartLocal {
        register: u16,
        name: Option<u32>,
        type_: Option<u32>,
        signature: Option<u32>,
    },
    EndLocal {
        register: u16,
    },
    RestartLocal {
        register: u16,
    },
    PrologueEnd,
    EpilogueBegin,
    SetSourceFile {
        source_file: Option<u32>,
    },
    LineNumber {
        line: u32,
    },
}

/// Debug item pinned to a code address
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AddressedDebugItem {
    pub address: usize,
    pub item: DebugItem,
}
