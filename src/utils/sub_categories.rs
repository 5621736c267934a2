use serde::Serialize;

use crate::db::ContentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const fn sub(id: &'static str, label: &'static str, description: &'static str) -> SubCategory {
    SubCategory {
        id,
        label,
        description,
    }
}

static JOKE: [SubCategory; 5] = [
    sub("general", "General/Classic Jokes", "Everyday humor anyone can relate to"),
    sub("african", "African Jokes", "Local humor, slang, culture, playful exaggerations"),
    sub("tech", "Tech & Geek Jokes", "Coding, gadgets, internet life"),
    sub("work", "Work & School Jokes", "Bosses, deadlines, exams, stress"),
    sub("dad", "Dad Jokes", "Short, corny, funny one-liners"),
];

static RIDDLE: [SubCategory; 5] = [
    sub("easy", "Easy Riddles", "Quick brain teasers"),
    sub("hard", "Tricky/Hard Riddles", "Make users think deeply"),
    sub("logic", "Logic Riddles", "Reasoning-based puzzles"),
    sub("word", "Word Riddles", "Language and wordplay"),
    sub("math", "Math Riddles", "Light numbers, no heavy calculations"),
];

static STORY: [SubCategory; 5] = [
    sub("moral", "Short Moral Stories", "Life lessons"),
    sub("funny", "Funny Stories", "Humorous mini-stories"),
    sub("african", "African Folktales", "Cultural, traditional storytelling"),
    sub("adventure", "Adventure Stories", "Excitement, exploration"),
    sub("fantasy", "Fantasy/AI Stories", "Imagination, future, robots"),
];

static FACT: [SubCategory; 5] = [
    sub("general", "General Fun Facts", "Random interesting truths"),
    sub("science", "Science & Tech Facts", "Space, AI, inventions"),
    sub("body", "Human Body Facts", "Weird, cool biology facts"),
    sub("african", "African Facts", "History, culture, nature"),
    sub("mindblowing", "Mind-Blowing Facts", "\"Wow\" moments"),
];

static PICKUP: [SubCategory; 5] = [
    sub("cute", "Cute Pickup Lines", "Sweet and friendly"),
    sub("funny", "Funny Pickup Lines", "Laugh-first approach"),
    sub("romantic", "Romantic Pickup Lines", "Smooth and charming"),
    sub("bold", "Bold/Confident Lines", "Direct energy (still respectful)"),
    sub("tech", "Tech Pickup Lines", "Nerdy but attractive"),
];

static MEME: [SubCategory; 5] = [
    sub("relatable", "Relatable Memes", "Everyday life situations"),
    sub("work", "Work/School Memes", "Stress, deadlines, exams"),
    sub("tech", "Tech Memes", "Coding, apps, bugs"),
    sub("african", "African Memes", "Lifestyle, culture, humor"),
    sub("random", "Random Funny Memes", "Anything hilarious"),
];

pub fn sub_categories(kind: ContentKind) -> &'static [SubCategory] {
    match kind {
        ContentKind::Joke => &JOKE,
        ContentKind::Riddle => &RIDDLE,
        ContentKind::Story => &STORY,
        ContentKind::Fact => &FACT,
        ContentKind::Pickup => &PICKUP,
        ContentKind::Meme => &MEME,
        ContentKind::Unknown => &[],
    }
}

/// Display label for a stored sub-category id, or the id itself when the
/// catalog has no entry for it.
pub fn sub_category_label(kind: ContentKind, id: &str) -> String {
    sub_categories(kind)
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.label.to_string())
        .unwrap_or_else(|| id.to_string())
}
