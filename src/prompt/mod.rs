mod affiliate;
mod assist;
mod structured;

pub use affiliate::{build_affiliate_prompt, AFFILIATE_VARIANTS};
pub use assist::{dialogue_script_prompt, feedback_prompt, smart_suggestions_prompt};
pub use structured::{
    build_movement_analysis_prompt, build_scene_image_prompt, build_structured_prompt,
    movement_analysis_schema, structured_prompt_schema, CTA_PHRASE,
};

use crate::models::{BlurLevel, ImageOptions, ImageResolution, PromptLanguage, VideoOptions};

pub const POSE_VARIANT_COUNT: usize = 4;

const REFERENCE_POSES_ID: [&str; POSE_VARIANT_COUNT] = [
    "dalam pose berdiri seluruh badan",
    "dalam pose duduk santai",
    "dalam pose berjalan, menghadap kamera",
    "sebagai foto potret close-up",
];

const REFERENCE_POSES_EN: [&str; POSE_VARIANT_COUNT] = [
    "in a full-body standing pose",
    "in a relaxed sitting pose",
    "in a walking pose, facing the camera",
    "as a close-up portrait photo",
];

const TEXT_POSES_ID: [&str; POSE_VARIANT_COUNT] = [
    "dalam pose berdiri seluruh badan, menghadap kamera",
    "dalam pose duduk santai di elemen yang ada di lingkungan tersebut (misal: kursi, tangga, batu)",
    "diambil dari sudut rendah, menampilkan subjek secara keseluruhan dengan latar yang megah",
    "sebagai foto potret close-up, fokus pada ekspresi wajah",
];

const TEXT_POSES_EN: [&str; POSE_VARIANT_COUNT] = [
    "in a full-body standing pose, facing the camera",
    "sitting casually on an element of the environment (e.g. a chair, stairs, a rock)",
    "shot from a low angle, showing the whole subject against an imposing backdrop",
    "as a close-up portrait photo, focused on the facial expression",
];

fn pick(language: PromptLanguage, indonesian: &'static str, english: &'static str) -> &'static str {
    match language {
        PromptLanguage::Indonesian => indonesian,
        PromptLanguage::English => english,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn blur_clause(language: PromptLanguage, blur: BlurLevel) -> Option<&'static str> {
    match blur {
        BlurLevel::None => None,
        BlurLevel::Low => Some(pick(
            language,
            "dengan latar belakang buram intensitas 20% (bokeh ringan)",
            "with a lightly blurred background at 20% intensity (soft bokeh)",
        )),
        BlurLevel::Medium => Some(pick(
            language,
            "dengan latar belakang buram intensitas 75% (bokeh sedang)",
            "with a moderately blurred background at 75% intensity (medium bokeh)",
        )),
        BlurLevel::High => Some(pick(
            language,
            "dengan latar belakang sangat buram (bokeh kuat)",
            "with a heavily blurred background (strong bokeh)",
        )),
    }
}

fn resolution_clause(language: PromptLanguage, resolution: ImageResolution) -> &'static str {
    match resolution {
        ImageResolution::Hd => pick(
            language,
            "resolusi tinggi, sangat detail",
            "high resolution, highly detailed",
        ),
        ImageResolution::FourK => pick(
            language,
            "kualitas 4K, sangat detail, fotorealistis",
            "4K quality, highly detailed, photorealistic",
        ),
        ImageResolution::EightK => pick(
            language,
            "kualitas 8K, resolusi sangat tinggi, pencahayaan sinematik, sangat detail",
            "8K quality, ultra high resolution, cinematic lighting, highly detailed",
        ),
    }
}

/// Folds the image form into the instruction sent to the model.
pub fn compose_image_prompt(options: &ImageOptions) -> String {
    let language = options.prompt_language();
    let mut body = format!(
        "{}{}{}{}",
        pick(language, "Sebuah penggambaran ", "A "),
        options.style.trim(),
        pick(language, " dari ", " depiction of "),
        options.subject.trim()
    );

    if let Some(details) = non_empty(&options.details) {
        body.push_str(", ");
        body.push_str(details);
    }

    let environment = [options.environment.resolve(), options.environment_details.as_str()]
        .iter()
        .filter_map(|part| non_empty(part))
        .collect::<Vec<_>>()
        .join(", ");
    if !environment.is_empty() {
        body.push_str(pick(language, ", di ", ", in "));
        body.push_str(&environment);
    }

    if let Some(time) = non_empty(&options.time_of_day) {
        body.push_str(pick(language, " pada ", " at "));
        body.push_str(time);
    }
    if let Some(angle) = non_empty(&options.camera_angle) {
        body.push_str(pick(language, ", sudut pandang ", ", shot from "));
        body.push_str(angle);
    }
    if let Some(lighting) = non_empty(&options.lighting_style) {
        body.push_str(pick(language, ", diterangi oleh ", ", lit by "));
        body.push_str(lighting);
    }
    if let Some(blur) = blur_clause(language, options.blur) {
        body.push_str(", ");
        body.push_str(blur);
    }
    if let Some(palette) = non_empty(&options.palette) {
        body.push_str(pick(language, ", dengan palet warna ", ", with the color palette "));
        body.push_str(palette);
    }
    // A reference image is cropped to the ratio instead.
    if !options.has_reference_image {
        body.push_str(pick(language, ", dalam rasio aspek ", ", in aspect ratio "));
        body.push_str(options.aspect_ratio.as_str());
    }

    body.push_str(". ");
    body.push_str(resolution_clause(language, options.resolution));
    body.push('.');

    if options.has_reference_image && options.remove_background {
        format!(
            "{} {body}",
            pick(
                language,
                "Hapus total latar belakang dari gambar ini, buat menjadi transparan, dan fokus hanya pada subjek utama. Setelah itu, terapkan deskripsi berikut ke subjek:",
                "Completely remove the background from this image, make it transparent, and focus only on the main subject. Then apply the following description to the subject:",
            )
        )
    } else {
        body
    }
}

/// Folds the video form into a single instruction.
pub fn compose_video_prompt(options: &VideoOptions) -> String {
    let language = options.prompt_language();
    let mut prompt = format!(
        "{}{}{}{}",
        pick(language, "Sebuah video ", "A "),
        options.style.trim(),
        pick(language, " dari ", " video of "),
        options.subject.trim()
    );

    let clauses: [(&str, &'static str, &'static str); 7] = [
        (options.action.as_str(), ", ", ", "),
        (options.environment.as_str(), ", diatur dalam ", ", set in "),
        (options.time_of_day.as_str(), " selama ", " during "),
        (options.camera_movement.as_str(), ", difilmkan dengan ", ", filmed with "),
        (options.lighting_style.as_str(), ", dengan ", ", with "),
        (options.palette.as_str(), ", menampilkan palet warna ", ", featuring the color palette "),
        (options.details.as_str(), ", ", ", "),
    ];
    for (value, indonesian, english) in clauses {
        if let Some(value) = non_empty(value) {
            prompt.push_str(pick(language, indonesian, english));
            prompt.push_str(value);
        }
    }
    prompt.push('.');

    if let Some(narration) = &options.narration {
        let clause = match language {
            PromptLanguage::Indonesian => format!(
                " Sertakan narasi audio dalam {} dengan suara {} bergaya {} untuk menyampaikan suasana {}.",
                narration.language, narration.voice_gender, narration.speaking_style, narration.mood
            ),
            PromptLanguage::English => format!(
                " Include audio narration in {} with a {} voice in a {} speaking style to convey a {} mood.",
                narration.language, narration.voice_gender, narration.speaking_style, narration.mood
            ),
        };
        prompt.push_str(&clause);
    }

    if let Some(dialogue) = options.dialogue.as_deref().and_then(non_empty) {
        prompt.push_str(pick(
            language,
            " Termasuk dialog berikut: \"",
            " Include the following dialogue: \"",
        ));
        prompt.push_str(dialogue);
        prompt.push_str("\".");
    }

    prompt.push_str(&format!(
        "{}{}{}{}.",
        pick(language, " Resolusi ", " Resolution "),
        options.resolution.as_str(),
        pick(language, ", rasio aspek ", ", aspect ratio "),
        options.aspect_ratio.as_str()
    ));

    prompt
}

pub fn pose_variants(language: PromptLanguage, with_reference: bool) -> &'static [&'static str; POSE_VARIANT_COUNT] {
    match (language, with_reference) {
        (PromptLanguage::Indonesian, true) => &REFERENCE_POSES_ID,
        (PromptLanguage::English, true) => &REFERENCE_POSES_EN,
        (PromptLanguage::Indonesian, false) => &TEXT_POSES_ID,
        (PromptLanguage::English, false) => &TEXT_POSES_EN,
    }
}

/// Edit instruction: keep everything from the reference, change only the pose.
pub fn build_reference_pose_prompt(language: PromptLanguage, prompt: &str, pose: &str) -> String {
    match language {
        PromptLanguage::Indonesian => format!(
            "Gunakan gambar referensi ini sebagai panduan visual utama. Pertahankan konsistensi pada penampilan subjek, pakaian, produk, dan latar belakang yang ada di gambar referensi. Terapkan prompt berikut: \"{prompt}\". Fokus utama perubahan adalah untuk menyesuaikan pose subjek menjadi: {pose}. Hindari perubahan drastis pada elemen-elemen penting lainnya."
        ),
        PromptLanguage::English => format!(
            "Use this reference image as the primary visual guide. Keep the subject's appearance, clothing, products and background from the reference image consistent. Apply the following prompt: \"{prompt}\". The main change is to adjust the subject's pose to: {pose}. Avoid drastic changes to the other important elements."
        ),
    }
}

/// Text-to-image instruction that pins background, clothing and product.
pub fn build_text_pose_prompt(language: PromptLanguage, prompt: &str, pose: &str) -> String {
    let prompt = prompt.trim().trim_end_matches('.');
    match language {
        PromptLanguage::Indonesian => format!(
            "{prompt}. INSTRUKSI PENTING: Latar belakang, pakaian model, dan produk apa pun yang dipegang atau ditampilkan harus TETAP SAMA di semua gambar. Jangan mengubahnya. Satu-satunya variasi yang diizinkan adalah pose subjek dan sudut kamera. Untuk gambar ini, gunakan pose berikut: {pose}."
        ),
        PromptLanguage::English => format!(
            "{prompt}. IMPORTANT INSTRUCTION: The background, the model's clothing and any product held or shown must STAY THE SAME across all images. Do not change them. The only allowed variation is the subject's pose and the camera angle. For this image, use the following pose: {pose}."
        ),
    }
}
