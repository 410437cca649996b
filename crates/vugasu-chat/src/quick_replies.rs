/// A canned question offered below the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuickReply {
    /// Short text on the suggestion chip.
    pub label: &'static str,
    /// The message put into the input when the chip is chosen.
    pub prompt: &'static str,
}

/// The suggestions offered by the widget, in display order.
pub const QUICK_REPLIES: [QuickReply; 10] = [
    QuickReply {
        label: "Available Puppies",
        prompt: "Tell me about your available puppies and their bloodlines.",
    },
    QuickReply {
        label: "Training Programs",
        prompt: "What training programs do you offer?",
    },
    QuickReply {
        label: "Schedule Visit",
        prompt: "I would like to schedule a visit to your facility.",
    },
    QuickReply {
        label: "Health Testing",
        prompt: "What health testing do you perform on your dogs?",
    },
    QuickReply {
        label: "Breeding Program",
        prompt: "Can you tell me about your breeding program and genetic health?",
    },
    QuickReply {
        label: "Puppy Care",
        prompt: "What advice do you have for new German Shepherd puppy owners?",
    },
    QuickReply {
        label: "Training Tips",
        prompt: "What are some essential training tips for German Shepherds?",
    },
    QuickReply {
        label: "Pricing",
        prompt: "What are your prices for puppies and training services?",
    },
    QuickReply {
        label: "Facility Tour",
        prompt: "Can you tell me about your facility and what to expect during a visit?",
    },
    QuickReply {
        label: "Lifetime Support",
        prompt: "What kind of lifetime support do you offer for your puppies?",
    },
];
