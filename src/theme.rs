use eframe::egui::Color32;

/// The fixed set of selectable themes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeChoice {
    Midnight,
    Slate,
    Paper,
}

impl ThemeChoice {
    pub fn all() -> [ThemeChoice; 3] {
        [ThemeChoice::Midnight, ThemeChoice::Slate, ThemeChoice::Paper]
    }

    pub fn name(self) -> &'static str {
        match self {
            ThemeChoice::Midnight => "Midnight",
            ThemeChoice::Slate => "Slate",
            ThemeChoice::Paper => "Paper",
        }
    }

    pub fn palette(self) -> &'static Theme {
        match self {
            ThemeChoice::Midnight => &MIDNIGHT,
            ThemeChoice::Slate => &SLATE,
            ThemeChoice::Paper => &PAPER,
        }
    }
}

/// An immutable named record of colors. Selected, never mutated.
pub struct Theme {
    pub gradient_top: Color32,
    pub gradient_bottom: Color32,
    pub sidebar: Color32,
    pub text: Color32,
    pub muted_text: Color32,
    pub button: Color32,
    pub button_hover: Color32,
    pub active_row: Color32,
    pub dialog: Color32,
    pub input: Color32,
    pub user_bubble: Color32,
    pub assistant_bubble: Color32,
    pub bubble_text: Color32,
}

const MIDNIGHT: Theme = Theme {
    gradient_top: Color32::from_rgb(20, 20, 20),
    gradient_bottom: Color32::from_rgb(50, 50, 50),
    sidebar: Color32::from_rgb(30, 30, 30),
    text: Color32::from_rgb(255, 255, 255),
    muted_text: Color32::from_rgb(160, 160, 160),
    button: Color32::from_rgb(70, 130, 180),
    button_hover: Color32::from_rgb(90, 150, 200),
    active_row: Color32::from_rgb(50, 50, 50),
    dialog: Color32::from_rgb(28, 28, 34),
    input: Color32::from_rgb(40, 40, 40),
    user_bubble: Color32::from_rgb(130, 190, 125),
    assistant_bubble: Color32::from_rgb(90, 200, 250),
    bubble_text: Color32::from_rgb(255, 255, 255),
};

const SLATE: Theme = Theme {
    gradient_top: Color32::from_rgb(24, 24, 32),
    gradient_bottom: Color32::from_rgb(38, 38, 52),
    sidebar: Color32::from_rgb(30, 30, 46),
    text: Color32::from_rgb(226, 226, 235),
    muted_text: Color32::from_rgb(140, 140, 160),
    button: Color32::from_rgb(59, 130, 246),
    button_hover: Color32::from_rgb(96, 155, 250),
    active_row: Color32::from_rgb(55, 55, 70),
    dialog: Color32::from_rgb(34, 34, 48),
    input: Color32::from_rgb(44, 44, 60),
    user_bubble: Color32::from_rgb(59, 130, 246),
    assistant_bubble: Color32::from_rgb(55, 65, 81),
    bubble_text: Color32::from_rgb(255, 255, 255),
};

const PAPER: Theme = Theme {
    gradient_top: Color32::from_rgb(245, 243, 238),
    gradient_bottom: Color32::from_rgb(228, 224, 214),
    sidebar: Color32::from_rgb(234, 230, 221),
    text: Color32::from_rgb(40, 38, 34),
    muted_text: Color32::from_rgb(120, 115, 105),
    button: Color32::from_rgb(70, 130, 180),
    button_hover: Color32::from_rgb(90, 150, 200),
    active_row: Color32::from_rgb(216, 211, 199),
    dialog: Color32::from_rgb(240, 237, 230),
    input: Color32::from_rgb(252, 251, 248),
    user_bubble: Color32::from_rgb(178, 210, 164),
    assistant_bubble: Color32::from_rgb(168, 203, 230),
    bubble_text: Color32::from_rgb(30, 30, 30),
};
