//! Prompt sent with the user's photo.

/// Build the generation prompt for `champion`.
#[must_use]
pub fn skin_prompt(champion: &str) -> String {
    format!(
        "Create a high-quality illustration of the League of Legends champion \"{champion}\" \
         but with the face/features of the person in the input image.\n\
         Style: Riot Games splash art, fantasy, cinematic lighting, highly detailed.\n\
         The character should be wearing {champion}'s costume and be in a dynamic pose \
         characteristic of the champion.\n\
         Ensure the face resembles the input person but adapted to the art style."
    )
}
