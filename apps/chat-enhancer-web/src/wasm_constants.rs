pub(crate) const CONFIG_GLOBAL: &str = "__CHAT_ENHANCER_CONFIG__";
pub(crate) const DEBUG_GLOBAL: &str = "watsonChatDebug";
pub(crate) const STYLE_ELEMENT_ID: &str = "watson-chat-enhancer-style";

pub(crate) const POPUP_TEXT_CLASS: &str = "watson-popup-text";
pub(crate) const POPUP_LETTER_CLASS: &str = "watson-popup-letter";
pub(crate) const POPUP_SPACE_CLASS: &str = "watson-popup-space";
pub(crate) const GREETING_PROCESSED_CLASS: &str = "watson-greeting-processed";
pub(crate) const GREETING_TITLE_CLASS: &str = "watson-greeting-h1";
pub(crate) const GREETING_BODY_CLASS: &str = "watson-greeting-h2";

pub(crate) const MUTATION_ATTRIBUTES: [&str; 2] = ["style", "class"];

/// Popup bubble states and the letter-by-letter typing animation. The page
/// stylesheet owns the intake form and close button.
pub(crate) const ENHANCER_CSS: &str = r"
#watson-chat-popup {
    position: absolute;
    bottom: 40px;
    left: 40px;
    background-color: white;
    color: #333;
    padding: 12px 16px;
    border-radius: 18px 18px 18px 0px;
    box-shadow: 0 4px 12px rgba(0,0,0,0) !important;
    border: none !important;
    font-family: Barlow, sans-serif, -apple-system;
    font-size: 14px;
    line-height: 1.4;
    font-weight: 500;
    z-index: 1000;
    opacity: 0;
    transform: translateY(10px) scale(0.95);
    transition: all 0.3s cubic-bezier(0.34, 1.56, 0.64, 1);
    pointer-events: none;
    white-space: nowrap;
    overflow: visible;
    cursor: default !important;
}
#watson-chat-popup.watson-popup-visible {
    opacity: 1;
    transform: translateY(0) scale(1);
    pointer-events: auto;
}
#watson-chat-popup.watson-popup-hiding {
    opacity: 0;
    transform: translateY(10px) scale(0.95);
    pointer-events: none;
}
#watson-chat-popup::before,
#watson-chat-popup::after {
    display: none !important;
}
#watson-chat-popup .watson-popup-text {
    position: relative;
    display: inline-block;
    white-space: nowrap;
}
#watson-chat-popup .watson-popup-letter {
    display: inline-block;
    opacity: 0;
    animation: watson-letter-in 0.2s ease-out both;
}
#watson-chat-popup .watson-popup-space {
    width: 0.25em;
}
@keyframes watson-letter-in {
    from { opacity: 0; transform: translateY(-10px); }
    to { opacity: 1; transform: translateY(0); }
}
";
