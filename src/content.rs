//! Content collaborator boundary.
//!
//! The match engine never owns the music-knowledge corpus; it pulls one
//! content unit per round through [`ContentLibrary`]. The built-in library
//! ships a small sample corpus so the server runs without external seeding.

use std::collections::HashMap;

use rand::seq::{IndexedRandom, IteratorRandom};
use serde::Serialize;

use crate::game::text::normalize;

/// Seed artist plus the collaboration graph for the chain mode.
#[derive(Debug, Clone)]
pub struct ChainPuzzle {
    /// Artist the chain starts from.
    pub seed: String,
    /// Collaborations keyed by normalized artist name.
    pub collaborations: HashMap<String, Vec<String>>,
}

impl ChainPuzzle {
    /// Collaborators of a (normalized) artist, empty when unknown.
    pub fn collaborators(&self, normalized: &str) -> &[String] {
        self.collaborations
            .get(normalized)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Theme plus the accepted entries for the themed-naming mode.
#[derive(Debug, Clone)]
pub struct ThemePuzzle {
    /// Human-readable theme shown to players.
    pub theme: String,
    /// Canonical accepted entries.
    pub entries: Vec<String>,
}

/// One true-or-false claim for the mytho mode.
#[derive(Debug, Clone)]
pub struct MythoClaim {
    /// Statement shown to both teams.
    pub statement: String,
    /// Server-only truth value, revealed at resolution.
    pub truth: bool,
}

/// Category prompt plus valid items for the betting mode.
#[derive(Debug, Clone)]
pub struct BettingPrompt {
    /// "How many X can you name" prompt.
    pub prompt: String,
    /// Canonical valid items.
    pub valid_items: Vec<String>,
}

/// Speed-trivia question for the buzzer mode.
#[derive(Debug, Clone)]
pub struct BuzzerQuestion {
    /// Question shown when the round opens.
    pub question: String,
    /// Server-only expected answer.
    pub answer: String,
}

/// Progressively revealed picture for the pixel mode.
#[derive(Debug, Clone)]
pub struct RevealPuzzle {
    /// URL of the picture the clients de-pixelate over time.
    pub image_url: String,
    /// Server-only expected answer.
    pub answer: String,
}

/// Attribute sheet of an artist, compared attribute by attribute in the
/// elimination mode.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistProfile {
    /// Stage name.
    pub name: String,
    /// Year of first release.
    pub debut_year: u16,
    /// Main genre label.
    pub genre: String,
    /// Country of origin.
    pub origin: String,
    /// Number of members (1 for solo acts).
    pub group_size: u8,
}

/// Candidate pool plus hidden target for the elimination mode.
#[derive(Debug, Clone)]
pub struct EliminationPuzzle {
    /// Guessable candidates, target included.
    pub candidates: Vec<ArtistProfile>,
    /// Index of the hidden target inside `candidates`.
    pub target: usize,
}

/// Quoted excerpt plus its expected continuation.
#[derive(Debug, Clone)]
pub struct ContinuationPrompt {
    /// Excerpt shown to players.
    pub prompt: String,
    /// Server-only expected continuation.
    pub continuation: String,
}

/// Read-only source of round content, shared by every room.
///
/// Implementations must tolerate concurrent reads; the engine never writes.
pub trait ContentLibrary: Send + Sync {
    /// Next chain puzzle.
    fn chain_puzzle(&self) -> ChainPuzzle;
    /// Next theme.
    fn theme_puzzle(&self) -> ThemePuzzle;
    /// Next true/false claim.
    fn mytho_claim(&self) -> MythoClaim;
    /// Next betting category.
    fn betting_prompt(&self) -> BettingPrompt;
    /// Next buzzer question.
    fn buzzer_question(&self) -> BuzzerQuestion;
    /// Next picture puzzle.
    fn reveal_puzzle(&self) -> RevealPuzzle;
    /// Next elimination pool.
    fn elimination_puzzle(&self) -> EliminationPuzzle;
    /// Next lyric continuation.
    fn continuation_prompt(&self) -> ContinuationPrompt;
}

/// Built-in sample corpus, picked from at random.
#[derive(Debug, Default)]
pub struct BuiltinLibrary;

impl BuiltinLibrary {
    /// Create the built-in library.
    pub fn new() -> Self {
        Self
    }
}

impl ContentLibrary for BuiltinLibrary {
    fn chain_puzzle(&self) -> ChainPuzzle {
        let pairs: &[(&str, &[&str])] = &[
            ("Jay-Z", &["Kanye West", "Rihanna", "Beyoncé", "Alicia Keys"]),
            ("Kanye West", &["Jay-Z", "Kid Cudi", "Rihanna", "Paul McCartney"]),
            ("Rihanna", &["Jay-Z", "Kanye West", "Calvin Harris", "Eminem"]),
            ("Eminem", &["Rihanna", "Dr. Dre", "50 Cent"]),
            ("Dr. Dre", &["Eminem", "Snoop Dogg", "50 Cent"]),
            ("Snoop Dogg", &["Dr. Dre", "Pharrell Williams", "Katy Perry"]),
            ("Calvin Harris", &["Rihanna", "Dua Lipa", "Sam Smith"]),
            ("Dua Lipa", &["Calvin Harris", "Elton John", "Angèle"]),
            ("Beyoncé", &["Jay-Z", "Shakira", "Ed Sheeran"]),
            ("Ed Sheeran", &["Beyoncé", "Justin Bieber", "Eminem"]),
        ];
        let collaborations = pairs
            .iter()
            .map(|(artist, features)| {
                (
                    normalize(artist),
                    features.iter().map(|f| f.to_string()).collect(),
                )
            })
            .collect();
        let seed = pairs
            .choose(&mut rand::rng())
            .map(|(artist, _)| artist.to_string())
            .unwrap_or_else(|| "Jay-Z".into());
        ChainPuzzle {
            seed,
            collaborations,
        }
    }

    fn theme_puzzle(&self) -> ThemePuzzle {
        let themes: &[(&str, &[&str])] = &[
            (
                "Daft Punk tracks",
                &[
                    "One More Time",
                    "Around the World",
                    "Harder Better Faster Stronger",
                    "Get Lucky",
                    "Da Funk",
                    "Instant Crush",
                    "Digital Love",
                ],
            ),
            (
                "Queen songs",
                &[
                    "Bohemian Rhapsody",
                    "Don't Stop Me Now",
                    "We Will Rock You",
                    "We Are the Champions",
                    "Under Pressure",
                    "Radio Ga Ga",
                ],
            ),
            (
                "Motown artists",
                &[
                    "Stevie Wonder",
                    "Marvin Gaye",
                    "Diana Ross",
                    "The Temptations",
                    "The Supremes",
                    "Smokey Robinson",
                ],
            ),
        ];
        let (theme, entries) = themes.choose(&mut rand::rng()).copied().unwrap_or(themes[0]);
        ThemePuzzle {
            theme: theme.into(),
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn mytho_claim(&self) -> MythoClaim {
        let claims: &[(&str, bool)] = &[
            ("Daft Punk won the Grammy for Album of the Year with Random Access Memories.", true),
            ("Freddie Mercury was born in Paris.", false),
            ("The Beatles never performed in France.", false),
            ("Billie Eilish recorded her first album in her brother's bedroom studio.", true),
            ("ABBA won the Eurovision Song Contest in 1974.", true),
            ("Mozart wrote more than 600 works before dying at 35.", true),
            ("Elvis Presley wrote most of his own songs.", false),
        ];
        let (statement, truth) = claims.choose(&mut rand::rng()).copied().unwrap_or(claims[0]);
        MythoClaim {
            statement: statement.into(),
            truth,
        }
    }

    fn betting_prompt(&self) -> BettingPrompt {
        let prompts: &[(&str, &[&str])] = &[
            (
                "Michael Jackson studio albums",
                &[
                    "Got to Be There",
                    "Ben",
                    "Off the Wall",
                    "Thriller",
                    "Bad",
                    "Dangerous",
                    "HIStory",
                    "Invincible",
                ],
            ),
            (
                "French rap artists",
                &[
                    "MC Solaar", "IAM", "NTM", "Booba", "Nekfeu", "Orelsan", "PNL", "SCH",
                    "Ninho", "Damso",
                ],
            ),
            (
                "Beyoncé number-one singles",
                &[
                    "Crazy in Love",
                    "Baby Boy",
                    "Irreplaceable",
                    "Single Ladies",
                    "Check on It",
                    "Texas Hold 'Em",
                ],
            ),
        ];
        let (prompt, items) = prompts.choose(&mut rand::rng()).copied().unwrap_or(prompts[0]);
        BettingPrompt {
            prompt: prompt.into(),
            valid_items: items.iter().map(|i| i.to_string()).collect(),
        }
    }

    fn buzzer_question(&self) -> BuzzerQuestion {
        let questions: &[(&str, &str)] = &[
            ("Which artist released the album 'Lemonade' in 2016?", "Beyoncé"),
            ("Which band recorded 'Smells Like Teen Spirit'?", "Nirvana"),
            ("Who is the best-selling female artist of the 1990s nicknamed the Queen of Pop?", "Madonna"),
            ("Which French duo performed wearing robot helmets?", "Daft Punk"),
            ("Who sang 'Rolling in the Deep'?", "Adele"),
        ];
        let (question, answer) = questions
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(questions[0]);
        BuzzerQuestion {
            question: question.into(),
            answer: answer.into(),
        }
    }

    fn reveal_puzzle(&self) -> RevealPuzzle {
        let puzzles: &[(&str, &str)] = &[
            ("/assets/covers/abbey-road.jpg", "The Beatles"),
            ("/assets/covers/discovery.jpg", "Daft Punk"),
            ("/assets/covers/thriller.jpg", "Michael Jackson"),
            ("/assets/covers/back-in-black.jpg", "AC/DC"),
        ];
        let (image_url, answer) = puzzles.choose(&mut rand::rng()).copied().unwrap_or(puzzles[0]);
        RevealPuzzle {
            image_url: image_url.into(),
            answer: answer.into(),
        }
    }

    fn elimination_puzzle(&self) -> EliminationPuzzle {
        let candidates = vec![
            ArtistProfile {
                name: "Daft Punk".into(),
                debut_year: 1993,
                genre: "electro".into(),
                origin: "France".into(),
                group_size: 2,
            },
            ArtistProfile {
                name: "Justice".into(),
                debut_year: 2003,
                genre: "electro".into(),
                origin: "France".into(),
                group_size: 2,
            },
            ArtistProfile {
                name: "Stromae".into(),
                debut_year: 2009,
                genre: "pop".into(),
                origin: "Belgium".into(),
                group_size: 1,
            },
            ArtistProfile {
                name: "Angèle".into(),
                debut_year: 2017,
                genre: "pop".into(),
                origin: "Belgium".into(),
                group_size: 1,
            },
            ArtistProfile {
                name: "Coldplay".into(),
                debut_year: 1998,
                genre: "rock".into(),
                origin: "United Kingdom".into(),
                group_size: 4,
            },
            ArtistProfile {
                name: "Radiohead".into(),
                debut_year: 1992,
                genre: "rock".into(),
                origin: "United Kingdom".into(),
                group_size: 5,
            },
        ];
        let target = (0..candidates.len())
            .choose(&mut rand::rng())
            .unwrap_or(0);
        EliminationPuzzle { candidates, target }
    }

    fn continuation_prompt(&self) -> ContinuationPrompt {
        let prompts: &[(&str, &str)] = &[
            (
                "Is this the real life?",
                "Is this just fantasy",
            ),
            (
                "Hello darkness my old friend,",
                "I've come to talk with you again",
            ),
            (
                "Buddy you're a boy make a big noise",
                "Playing in the street gonna be a big man someday",
            ),
            (
                "We don't need no education,",
                "We don't need no thought control",
            ),
        ];
        let (prompt, continuation) = prompts
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(prompts[0]);
        ContinuationPrompt {
            prompt: prompt.into(),
            continuation: continuation.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_seed_always_has_collaborators() {
        let library = BuiltinLibrary::new();
        for _ in 0..20 {
            let puzzle = library.chain_puzzle();
            assert!(!puzzle.collaborators(&normalize(&puzzle.seed)).is_empty());
        }
    }

    #[test]
    fn elimination_target_is_in_range() {
        let library = BuiltinLibrary::new();
        let puzzle = library.elimination_puzzle();
        assert!(puzzle.target < puzzle.candidates.len());
    }
}
