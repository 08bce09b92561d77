//! Paths of game resources inside the archives
//!
//! Paths use the forward-slash form with a leading separator. Localized
//! paths carry [`LANGUAGE_TOKEN`] or [`LANGUAGE_FONT_TOKEN`], which
//! [`localize`] replaces.

/// Replaced with the configured language code
pub const LANGUAGE_TOKEN: &str = "{LANG}";

/// Replaced with the font set of the configured language
pub const LANGUAGE_FONT_TOKEN: &str = "{LANG_FONT}";

/// Font set shared by every language that uses the latin alphabet
pub const LATIN_FONT_SET: &str = "latin";

/// Substitute the language tokens in a resource path.
///
/// Chinese has its own font set; every other language uses the latin one.
pub fn localize(path: &str, language: &str) -> String {
    let font_set = if language.eq_ignore_ascii_case("CHI") {
        language
    } else {
        LATIN_FONT_SET
    };
    path.replace(LANGUAGE_FONT_TOKEN, font_set)
        .replace(LANGUAGE_TOKEN, language)
}

macro_rules! resource_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $path:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every entry of the table
            pub const ALL: &'static [Self] = &[$( Self::$variant ),+];

            /// Path of the resource inside the archives
            pub const fn path(self) -> &'static str {
                match self {
                    $( Self::$variant => $path ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.path())
            }
        }
    };
}

resource_table! {
    /// Fixed resources used by the front end
    ResourcePath {
        /// Loading screen
        LoadingScreen => "/data/global/ui/Loading/loadingscreen.dc6",
        /// Main menu background
        TrademarkScreen => "/data/global/ui/FrontEnd/trademarkscreenEXP.dc6",
        /// Game type selection background
        GameSelectScreen => "/data/global/ui/FrontEnd/gameselectscreenEXP.dc6",
        /// TCP/IP screen background
        TcpIpBackground => "/data/global/ui/FrontEnd/TCPIPscreen.dc6",
        /// Logo flames, left half
        Diablo2LogoFireLeft => "/data/global/ui/FrontEnd/D2logoFireLeft.DC6",
        /// Logo flames, right half
        Diablo2LogoFireRight => "/data/global/ui/FrontEnd/D2logoFireRight.DC6",
        /// Logo background, left half
        Diablo2LogoBlackLeft => "/data/global/ui/FrontEnd/D2logoBlackLeft.DC6",
        /// Logo background, right half
        Diablo2LogoBlackRight => "/data/global/ui/FrontEnd/D2logoBlackRight.DC6",
        /// Credits background
        CreditsBackground => "/data/global/ui/CharSelect/creditsbckgexpand.dc6",
        /// Credits text (localized)
        CreditsText => "/data/local/ui/{LANG}/ExpansionCredits.txt",
        /// Cinematics selection background
        CinematicsBackground => "/data/global/ui/FrontEnd/CinematicsSelectionEXP.dc6",
        /// Character creation background
        CharacterSelectBackground => "/data/global/ui/FrontEnd/charactercreationscreenEXP.dc6",
        /// Character creation campfire
        CharacterSelectCampfire => "/data/global/ui/FrontEnd/fire.DC6",
        /// Character selection background
        CharacterSelectionBackground => "/data/global/ui/CharSelect/characterselectscreenEXP.dc6",
        /// Character selection highlight box
        CharacterSelectionSelectBox => "/data/global/ui/CharSelect/charselectbox.dc6",
        /// OK / Cancel popup
        PopUpOkCancel => "/data/global/ui/FrontEnd/PopUpOKCancel.dc6",
        /// Default mouse cursor
        CursorDefault => "/data/global/ui/CURSOR/ohand.DC6",
        /// 6 point font
        Font6 => "/data/local/FONT/{LANG_FONT}/font6",
        /// 8 point font
        Font8 => "/data/local/FONT/{LANG_FONT}/font8",
        /// 16 point font
        Font16 => "/data/local/FONT/{LANG_FONT}/font16",
        /// 24 point font
        Font24 => "/data/local/FONT/{LANG_FONT}/font24",
        /// 30 point font
        Font30 => "/data/local/FONT/{LANG_FONT}/font30",
        /// 42 point font
        Font42 => "/data/local/FONT/{LANG_FONT}/font42",
        /// Formal 12 point font
        FontFormal12 => "/data/local/FONT/{LANG_FONT}/fontformal12",
        /// Exocet 10 point font
        FontExocet10 => "/data/local/FONT/{LANG_FONT}/fontexocet10",
        /// Level definitions
        LevelDetails => "/data/global/excel/Levels.txt",
        /// Level presets
        LevelPreset => "/data/global/excel/LvlPrest.txt",
        /// Level tile types
        LevelType => "/data/global/excel/LvlTypes.txt",
        /// Level warps
        LevelWarp => "/data/global/excel/LvlWarp.txt",
        /// Object definitions
        ObjectDetails => "/data/global/excel/Objects.txt",
        /// Object types
        ObjectType => "/data/global/excel/objtype.txt",
        /// Sound settings
        SoundSettings => "/data/global/excel/Sounds.txt",
        /// Item stat costs
        ItemStatCost => "/data/global/excel/ItemStatCost.txt",
        /// Item types
        ItemTypes => "/data/global/excel/ItemTypes.txt",
        /// Difficulty levels
        DifficultyLevels => "/data/global/excel/difficultylevels.txt",
        /// Skills
        Skills => "/data/global/excel/skills.txt",
        /// Treasure classes
        TreasureClass => "/data/global/excel/TreasureClass.txt",
    }
}

resource_table! {
    /// Color palettes
    Palette {
        /// Act 1
        Act1 => "/data/global/palette/act1/pal.dat",
        /// Act 2
        Act2 => "/data/global/palette/act2/pal.dat",
        /// Act 3
        Act3 => "/data/global/palette/act3/pal.dat",
        /// Act 4
        Act4 => "/data/global/palette/act4/pal.dat",
        /// Act 5
        Act5 => "/data/global/palette/act5/pal.dat",
        /// End game
        EndGame => "/data/global/palette/endgame/pal.dat",
        /// End game, second variant
        EndGame2 => "/data/global/palette/endgame2/pal.dat",
        /// Fechar
        Fechar => "/data/global/palette/fechar/pal.dat",
        /// Loading screen
        Loading => "/data/global/palette/loading/pal.dat",
        /// Menu 0
        Menu0 => "/data/global/palette/menu0/pal.dat",
        /// Menu 1
        Menu1 => "/data/global/palette/menu1/pal.dat",
        /// Menu 2
        Menu2 => "/data/global/palette/menu2/pal.dat",
        /// Menu 3
        Menu3 => "/data/global/palette/menu3/pal.dat",
        /// Menu 4
        Menu4 => "/data/global/palette/menu4/pal.dat",
        /// Sky
        Sky => "/data/global/palette/sky/pal.dat",
        /// Static
        Static => "/data/global/palette/static/pal.dat",
        /// Trademark screen
        Trademark => "/data/global/palette/trademark/pal.dat",
        /// Units
        Units => "/data/global/palette/units/pal.dat",
    }
}

impl ResourcePath {
    /// Path with language tokens replaced
    pub fn localized(self, language: &str) -> String {
        localize(self.path(), language)
    }

    /// Whether the path contains a language token
    pub fn is_localized(self) -> bool {
        self.path().contains(LANGUAGE_TOKEN) || self.path().contains(LANGUAGE_FONT_TOKEN)
    }
}
