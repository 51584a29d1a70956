use crate::models::{AffiliateRequest, AffiliateStyle};

/// Framing of each of the 4 images inside a style set.
pub const AFFILIATE_VARIANTS: [&str; 4] = [
    "wide shot that shows the whole scene and the product in context",
    "medium shot with the product clearly held or presented",
    "close-up on the product details, label and texture",
    "dynamic angle with movement, the product still in sharp focus",
];

fn style_block(style: AffiliateStyle) -> &'static str {
    match style {
        AffiliateStyle::BRoll => {
            "STYLE: B-Roll. Cinematic product-focused still: hands interacting with the product, close details, shallow depth of field, no direct eye contact with the camera, no talking-head framing."
        }
        AffiliateStyle::Ugc => {
            "STYLE: UGC (user-generated content). Authentic smartphone-style photo of the model using the product in a real home setting, natural window light, casual framing, genuine expression."
        }
        AffiliateStyle::Commercial => {
            "STYLE: Commercial. Polished advertising shot, professional studio lighting, clean composition, premium look worthy of a national campaign."
        }
    }
}

/// Shared instruction, style block and variant line for one affiliate image.
/// Reference images are sent in the order main product, supporting products,
/// model images.
pub fn build_affiliate_prompt(request: &AffiliateRequest, style: AffiliateStyle, variant: usize) -> String {
    let mut prompt = String::from(
        "Create a professional affiliate marketing photo. The FIRST reference image is the main product; it must appear identical (shape, color, label, packaging).",
    );

    if let Some(description) = Some(request.description.trim()).filter(|d| !d.is_empty()) {
        prompt.push_str(&format!("\nProduct / concept: {description}."));
    }

    for (index, supporting) in request.supporting_images.iter().enumerate() {
        let position = index + 2;
        match supporting.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(description) => prompt.push_str(&format!(
                "\nReference image {position} is a supporting product: {description}."
            )),
            None => prompt.push_str(&format!(
                "\nReference image {position} is a supporting product."
            )),
        }
    }

    let mut model = format!("\nModel: {} {}", request.model_type.trim(), request.model_age.trim());
    if request.hijab {
        model.push_str(", wearing a hijab");
    }
    model.push('.');
    prompt.push_str(&model);
    if !request.model_images.is_empty() {
        prompt.push_str(&format!(
            " Use the last {} reference image(s) for the model's face and body; keep the same person.",
            request.model_images.len()
        ));
    }

    prompt.push_str(&format!(
        "\nAspect ratio: {}. Ad type: {}. The ad will be narrated in {} with a {} accent; match the cultural setting.",
        request.aspect_ratio,
        request.ad_type.trim(),
        request.narration_language.trim(),
        request.narration_accent.trim()
    ));

    if request.text_overlay {
        prompt.push_str("\nAdd a short, catchy promotional text overlay that does not cover the product.");
    } else {
        prompt.push_str("\nDo not add any text, logos or watermarks.");
    }

    prompt.push_str("\n\n");
    prompt.push_str(style_block(style));
    prompt.push_str(&format!(
        "\nVariation {} of {}: {}.",
        variant + 1,
        AFFILIATE_VARIANTS.len(),
        AFFILIATE_VARIANTS[variant % AFFILIATE_VARIANTS.len()]
    ));

    prompt
}
