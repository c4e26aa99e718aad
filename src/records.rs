use std::path::{Path, PathBuf};

/// Pseudo-category that matches every record.
pub const ALL_CATEGORY: &str = "all";

#[derive(Debug, Clone, Copy)]
/// One portfolio photograph: relative path, display caption, category tags.
pub struct ImageRecord {
    pub path: &'static str,
    pub caption: &'static str,
    pub categories: &'static [&'static str],
}

impl ImageRecord {
    pub fn matches(&self, tag: &str) -> bool {
        tag == ALL_CATEGORY || self.categories.contains(&tag)
    }

    /// Absolute location of the image under the configured gallery directory.
    pub fn resolve(&self, base: &Path) -> PathBuf {
        base.join(self.path)
    }
}

/// The portfolio set, in display order. Fixed at compile time; there is no
/// external record source or schema validation.
pub static PORTFOLIO: &[ImageRecord] = &[
    ImageRecord {
        path: "Ananya_Fall_Shoot_133.jpg",
        caption: "Fall Portrait",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_138.jpg",
        caption: "Fall Collection",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_202.jpg",
        caption: "Autumn Vibes",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_203.jpg",
        caption: "Fall Portrait",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_208.jpg",
        caption: "Autumn Collection",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_238.jpg",
        caption: "Fall Portrait",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_257.jpg",
        caption: "Autumn Mood",
        categories: &["fall"],
    },
    ImageRecord {
        path: "Ananya_Fall_Shoot_268.jpg",
        caption: "Fall Portrait",
        categories: &["fall"],
    },
    ImageRecord {
        path: "UVA02861.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "UVA03304.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "UVA03409.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
    ImageRecord {
        path: "UVA03434.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "UVA03441.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_112.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
    ImageRecord {
        path: "VANI_EDIT_117.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_119.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_122.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
    ImageRecord {
        path: "VANI_EDIT_19.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_2.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_38.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
    ImageRecord {
        path: "VANI_EDIT_46.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_59.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_6.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
    ImageRecord {
        path: "VANI_EDIT_81.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_94.jpg",
        caption: "Portrait",
        categories: &["portrait"],
    },
    ImageRecord {
        path: "VANI_EDIT_95.jpg",
        caption: "Portrait Series",
        categories: &["portrait", "editorial"],
    },
];

/// Distinct category tags in first-seen order, for the filter bar.
pub fn category_tags() -> Vec<&'static str> {
    let mut tags = Vec::new();
    for record in PORTFOLIO {
        for tag in record.categories {
            if !tags.contains(tag) {
                tags.push(*tag);
            }
        }
    }
    tags
}
