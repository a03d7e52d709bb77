/// Fixed content served by the canned routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedContent {
    pub name: &'static str,
    pub content_type: &'static str,
    pub body: &'static [u8],
    /// Append the request/response trace after the fixed body
    pub append_trace: bool,
}

pub static PONG: CannedContent = CannedContent {
    name: "ping",
    content_type: "text/plain",
    body: b"pong\n",
    append_trace: false,
};

pub static HELLO_WORLD: CannedContent = CannedContent {
    name: "hello_world",
    content_type: "text/plain",
    body: b"Hello, World!\n",
    append_trace: false,
};

pub static HELP: CannedContent = CannedContent {
    name: "help",
    content_type: "text/plain",
    body: include_bytes!("../../assets/help.md"),
    append_trace: true,
};

pub static FOOTBALL: CannedContent = CannedContent {
    name: "football",
    content_type: "image/svg+xml",
    body: include_bytes!("../../assets/football.svg"),
    append_trace: false,
};

/// Headers advertised on OPTIONS for canned routes
pub const CORS_HEADERS: [(&str, &str); 5] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET,HEAD,OPTIONS"),
    ("Access-Control-Allow-Headers", "Origin,Range"),
    ("Access-Control-Expose-Headers", "Cache-Control,Date,Expires,Server"),
    ("Access-Control-Max-Age", "60"),
];

/// `Allow` value sent with `405` answers from canned routes
pub const ALLOWED_METHODS: &str = "GET,HEAD,OPTIONS,POST";
