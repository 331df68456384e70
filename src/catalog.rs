//! Built-in form options per education level.

// Grades offered per education level
pub static GRADES: phf::Map<&'static str, &'static [&'static str]> = phf::phf_map! {
    "SMA" => &["10", "11", "12"],
};

// Subjects per education level - merged with user-added ones in `prefs`
pub static SUBJECTS: phf::Map<&'static str, &'static [&'static str]> = phf::phf_map! {
    "SMA" => &[
        // national curriculum
        "Antropologi", "Bahasa Indonesia", "Bahasa Inggris", "Bahasa Sunda",
        "Biologi", "Ekonomi", "Fisika", "Geografi", "Informatika", "Kimia",
        "Koding dan Kecerdasan Artifisial (KKA)", "Life Skill", "Matematika",
        "Matematika Tingkat Lanjut", "PENDIDIKAN AGAMA ISLAM", "Pendidikan Pancasila",
        "Penjaskes", "Prakarya", "Sejarah", "Seni Budaya", "Sosiologi",

        // pesantren / language subjects
        "Al Qur'an", "Bahasa Arab", "Fiqih", "Grammar", "Hadits", "Insya",
        "Mushtolahul Hadits", "Nahwu", "Sharaf", "Tahfidz", "Tarbiyah",
        "Tarikh Islam", "Ulumul Quran", "Ushul Fiqh",
    ],
};

// Weekly lesson-hour allocations per education level
pub static TIME_ALLOCATIONS: phf::Map<&'static str, &'static [&'static str]> = phf::phf_map! {
    "SMA" => &[
        "2 JP/minggu (90 menit/minggu)",
        "3 JP/minggu (135 menit/minggu)",
        "4 JP/minggu (180 menit/minggu)",
    ],
};

pub const DEFAULT_EDUCATION_LEVEL: &str = "SMA";
pub const DEFAULT_SEMESTER: &str = "1";
pub const DEFAULT_ACADEMIC_YEAR: &str = "2025-2026";
pub const DEFAULT_EXAM_DURATION: &str = "90 Menit";
pub const DEFAULT_ASSESSMENT_TITLE: &str = "PENILAIAN SUMATIF AKHIR SEMESTER GANJIL";
pub const DEFAULT_TRYOUT_TITLE: &str = "TRY OUT UJIAN AKHIR SEKOLAH";

pub fn grades_for(level: &str) -> &'static [&'static str] {
    GRADES.get(level).copied().unwrap_or(&[])
}

pub fn subjects_for(level: &str) -> &'static [&'static str] {
    SUBJECTS.get(level).copied().unwrap_or(&[])
}

pub fn time_allocations_for(level: &str) -> &'static [&'static str] {
    TIME_ALLOCATIONS.get(level).copied().unwrap_or(&[])
}

/// Curriculum phase for a grade. Senior high: grade 10 is phase E, the rest F.
pub fn phase_for(level: &str, grade: &str) -> Option<&'static str> {
    match level {
        "SMA" => match grade.trim().parse::<u32>() {
            Ok(10) => Some("Fase E"),
            _ => Some("Fase F"),
        },
        _ => None,
    }
}
