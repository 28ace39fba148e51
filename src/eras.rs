// src/eras.rs
use crate::models::{EraId, EraStyle};

pub static ERAS: [EraStyle; 5] = [
    EraStyle {
        id: EraId::Modern,
        year: 2024,
        description: "High Dynamic Range, clean digital look, modern fashion.",
        prompt: "A high-quality 2024 modern photograph. Sharp details, professional lighting, modern minimalist clothing, and high dynamic range.",
        color: "from-blue-500 to-cyan-400",
        icon: "fa-solid fa-mobile-screen-button",
    },
    EraStyle {
        id: EraId::Instagram,
        year: 2012,
        description: "Early Instagram filters, heavy HDR, hipster vibes.",
        prompt: "Transform this image to look like an early 2010s Instagram photo. Use 'Valencia' or 'Lo-fi' filter aesthetics, slight vignette, higher saturation, and 2010s fashion trends like infinity scarves or flannel.",
        color: "from-purple-500 to-pink-500",
        icon: "fa-brands fa-instagram",
    },
    EraStyle {
        id: EraId::Y2k,
        year: 2003,
        description: "Point-and-shoot digital noise, glossy Y2K aesthetic.",
        prompt: "Transform this photo into a 2003 digital camera aesthetic. Low resolution digital noise, harsh direct flash, high contrast, glossy finish, and Y2K era fashion (denim, tracksuits, frosted tips).",
        color: "from-emerald-400 to-teal-500",
        icon: "fa-solid fa-compact-disc",
    },
    EraStyle {
        id: EraId::RetroGrunge,
        year: 1994,
        description: "Disposable camera film, muted tones, grunge era.",
        prompt: "A 1994 disposable camera aesthetic. Heavy film grain, slightly desaturated colors, 90s grunge fashion (oversized sweaters, flannels), and a nostalgic, authentic film texture.",
        color: "from-orange-500 to-amber-600",
        icon: "fa-solid fa-cassette-tape",
    },
    EraStyle {
        id: EraId::NeonGrain,
        year: 1985,
        description: "Polaroid warmth, neon glows, big hair energy.",
        prompt: "Transform this into an authentic 1985 Polaroid. Warm color temperature, soft focus, significant film grain, big 80s hairstyles, neon-accented fashion, and a vintage analog feel.",
        color: "from-red-500 to-orange-400",
        icon: "fa-solid fa-radio",
    },
];

pub fn all() -> &'static [EraStyle] {
    &ERAS
}

/// The catalog's first entry; selected when a session starts.
pub fn default_era() -> &'static EraStyle {
    &ERAS[0]
}

pub fn era(id: EraId) -> &'static EraStyle {
    // Every EraId has exactly one catalog entry (checked in tests).
    ERAS.iter().find(|style| style.id == id).unwrap_or(&ERAS[0])
}

pub fn find_era(identifier: &str) -> Option<&'static EraStyle> {
    ERAS.iter().find(|style| style.id.as_str() == identifier)
}
