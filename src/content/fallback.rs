use crate::types::{ContentType, Level, Prompt, PromptSource};

use ContentType::*;

/// (text, type, level, adult)
const FALLBACK: &[(&str, ContentType, u8, bool)] = &[
    // Questions
    ("What is the most useless talent you have?", Question, 1, false),
    ("Which song would play on repeat in your personal hell?", Question, 1, false),
    ("What is the worst gift you have ever received?", Question, 2, false),
    ("What is the pettiest reason you stopped talking to someone?", Question, 3, false),
    ("What is the most awkward place you have been caught flirting?", Question, 2, true),
    ("Who in this room would you trust to plan your bachelor party?", Question, 3, true),
    // Truths
    ("Have you ever pretended to be sick to skip a party?", Truth, 1, false),
    ("What is the last lie you told?", Truth, 1, false),
    ("Which person here would you call first if you got arrested?", Truth, 2, false),
    ("What is the most embarrassing thing in your search history?", Truth, 3, false),
    ("Who was your most regrettable kiss?", Truth, 2, true),
    ("What is the boldest text you have ever sent at 2am?", Truth, 3, true),
    // Dares
    ("Speak in an accent until your next turn.", Dare, 1, false),
    ("Let the group pick a new profile picture for you.", Dare, 2, false),
    ("Do your best runway walk across the room.", Dare, 1, false),
    ("Call a random contact and sing them happy birthday.", Dare, 3, false),
    ("Give the person to your left a slow-motion compliment.", Dare, 2, true),
    ("Read your most recent flirty message out loud.", Dare, 3, true),
    // Chaos rules
    ("Nobody may say the word 'drink' until the next rule. Offenders drink.", ChaosRule, 1, false),
    ("Everyone must point with their elbow. Forget and take a sip.", ChaosRule, 1, false),
    ("The current player is Question Master: anyone answering their questions drinks.", ChaosRule, 2, false),
    ("Swap seats with the person opposite you. Last to sit drinks twice.", ChaosRule, 3, false),
    ("Until the next rule, every sentence must end with 'baby'. Slip and drink.", ChaosRule, 2, true),
    ("Whoever has the most recent ex drinks for every turn this cycle.", ChaosRule, 3, true),
    // Votes
    ("Who is most likely to get lost in their own neighbourhood?", Vote, 1, false),
    ("Who would survive longest in a zombie apocalypse?", Vote, 1, false),
    ("Who is most likely to become famous by accident?", Vote, 2, false),
    ("Who would be the worst roommate here?", Vote, 3, false),
    ("Who is most likely to have a secret dating profile?", Vote, 2, true),
    ("Who here has the wildest story they have never told?", Vote, 3, true),
];

/// Built-in prompts used when the content store cannot be reached.
/// Covers every content type at every level, with and without 18+.
pub fn fallback_prompts() -> Vec<Prompt> {
    FALLBACK
        .iter()
        .enumerate()
        .filter_map(|(i, (text, content_type, level, adult))| {
            Some(Prompt {
                id: format!("fallback-{}-{}", content_type, i),
                text: text.to_string(),
                content_type: *content_type,
                level: Level::new(*level)?,
                adult: *adult,
                source: PromptSource::Fallback,
            })
        })
        .collect()
}
